//! Plan execution.
//!
//! The executor runs a plan's steps strictly in declared order through the
//! connector bound to the connection, in one of three modes, and records
//! the outcome as a run. A step failure stops the iteration at that step;
//! everything executed so far stays visible in the run record.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tether_audit::AuditLogger;
use tether_connector::{ActionContext, ActionRequest, Connector, ConnectorRegistry};
use tether_core::{
    Connection, ExecutionMode, Plan, PlanStatus, Run, RunStatus, StepResult,
};
use tether_store::Store;

use crate::error::ExecutorError;
use crate::rollback;

pub struct Executor {
    registry: Arc<ConnectorRegistry>,
    store: Arc<dyn Store>,
    audit: Arc<AuditLogger>,
}

impl Executor {
    pub fn new(
        registry: Arc<ConnectorRegistry>,
        store: Arc<dyn Store>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self {
            registry,
            store,
            audit,
        }
    }

    pub(crate) fn registry(&self) -> &ConnectorRegistry {
        &self.registry
    }

    pub(crate) fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub(crate) fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Execute (or dry-run) a plan against a connection.
    ///
    /// Steps run sequentially, never in parallel: later steps may depend on
    /// earlier snapshots, and partial-failure semantics need a
    /// deterministic cut point. Two runs against the same connection are
    /// not serialized by this engine; a host needing per-connection mutual
    /// exclusion must impose it in the store or a scheduler.
    pub async fn execute_plan(
        &self,
        plan: &Plan,
        connection: &Connection,
        dry_run: bool,
    ) -> Result<Run, ExecutorError> {
        if !connection.is_active() {
            return Err(ExecutorError::ConnectionInactive {
                connection_id: connection.id,
            });
        }
        if !dry_run && plan.status != PlanStatus::Approved {
            return Err(ExecutorError::PlanNotExecutable {
                plan_id: plan.id,
                status: plan.status,
            });
        }

        let connector =
            self.registry
                .lookup(&connection.provider)
                .ok_or_else(|| ExecutorError::UnknownProvider {
                    provider: connection.provider.clone(),
                })?;

        let mut run = Run {
            id: Uuid::new_v4(),
            plan_id: plan.id,
            dry_run,
            status: RunStatus::Running,
            success: false,
            step_results: Vec::with_capacity(plan.steps.len()),
            error: None,
            snapshot_id: None,
            started_at: Utc::now(),
            finished_at: None,
        };

        tracing::info!(
            run_id = %run.id,
            plan_id = %plan.id,
            provider = %connection.provider,
            dry_run,
            steps = plan.steps.len(),
            "executing plan"
        );

        for step in &plan.steps {
            let request = ActionRequest {
                context: ActionContext {
                    connection_id: connection.id,
                    tenant_id: connection.tenant_id.clone(),
                    access_token: connection.access_token.clone(),
                },
                input: step.input.clone(),
                dry_run,
            };

            // Any connector failure is caught at the step boundary; the
            // run record always comes back to the caller.
            match connector.execute_action(&step.action_id, request).await {
                Ok(result) => {
                    run.step_results.push(StepResult {
                        action_id: step.action_id.clone(),
                        success: true,
                        execution_mode: result.execution_mode,
                        output: result.output,
                        evidence: result.evidence,
                        snapshot: result.snapshot,
                        rollback_plan: result.rollback_plan,
                        error: None,
                    });
                }
                Err(err) => {
                    let message = err.to_string();
                    tracing::warn!(
                        run_id = %run.id,
                        action = %step.action_id,
                        error = %message,
                        "step failed; halting run"
                    );
                    run.step_results.push(StepResult {
                        action_id: step.action_id.clone(),
                        success: false,
                        execution_mode: if dry_run {
                            ExecutionMode::PlanOnly
                        } else {
                            ExecutionMode::Auto
                        },
                        output: serde_json::Value::Null,
                        evidence: serde_json::Value::Null,
                        snapshot: None,
                        rollback_plan: None,
                        error: Some(message.clone()),
                    });
                    run.error = Some(message);
                    break;
                }
            }
        }

        run.success = run.error.is_none();
        run.status = if run.success {
            RunStatus::Succeeded
        } else {
            RunStatus::Failed
        };
        run.finished_at = Some(Utc::now());

        // Whole-run rollback addressing exists only when every executed
        // step captured pre-state.
        if run.success
            && !run.step_results.is_empty()
            && run.step_results.iter().all(|s| s.snapshot.is_some())
        {
            run.snapshot_id = Some(format!("snapshot-{}", run.id.simple()));
        }

        self.store.create_run(run.clone()).await?;

        // A dry-run is a preview: it never advances the plan.
        if !dry_run {
            let mut updated = plan.clone();
            let transition = if run.success {
                updated.mark_executed()
            } else {
                updated.mark_failed()
            };
            match transition {
                Ok(()) => self.store.update_plan(updated).await?,
                Err(err) => {
                    tracing::warn!(plan_id = %plan.id, error = %err, "plan status not advanced")
                }
            }
        }

        if let Err(err) = self
            .audit
            .log_run(
                &connection.tenant_id,
                &connection.provider,
                &connection.user_id,
                plan.id,
                run.id,
                dry_run,
                run.success,
                run.step_results.len(),
                run.error.as_deref(),
            )
            .await
        {
            tracing::warn!(run_id = %run.id, error = %err, "audit append failed");
        }

        Ok(run)
    }

    /// Replay a run's recorded rollback plans, newest step first.
    ///
    /// Best-effort per step: a step without a rollback plan is recorded as
    /// a limitation and skipped; a reversal failure is recorded and the
    /// remaining steps still proceed. Produces a new record; the original
    /// run is only marked rolled back.
    pub async fn execute_rollback(
        &self,
        run_id: Uuid,
        actor_id: &str,
    ) -> Result<tether_core::RollbackRecord, ExecutorError> {
        rollback::execute(self, run_id, actor_id).await
    }
}

/// Shared by the executor and rollback path: one step invocation with the
/// failure folded into a result.
pub(crate) async fn invoke_action(
    connector: &Arc<dyn Connector>,
    connection: &Connection,
    action_id: &str,
    input: serde_json::Value,
) -> Result<tether_connector::ActionResult, String> {
    let request = ActionRequest {
        context: ActionContext {
            connection_id: connection.id,
            tenant_id: connection.tenant_id.clone(),
            access_token: connection.access_token.clone(),
        },
        input,
        dry_run: false,
    };
    connector
        .execute_action(action_id, request)
        .await
        .map_err(|e| e.to_string())
}
