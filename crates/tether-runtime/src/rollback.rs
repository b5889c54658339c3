//! Rollback execution.
//!
//! Walks a succeeded run's steps in reverse order, replaying each recorded
//! rollback plan through the same connector. Rollback may be requested long
//! after the run, by a different actor; everything it needs is in the
//! stored run record.

use chrono::Utc;
use uuid::Uuid;

use tether_core::{
    RollbackRecord, RollbackStepOutcome, RollbackStepResult, RunStatus,
};

use crate::error::ExecutorError;
use crate::executor::{invoke_action, Executor};

pub(crate) async fn execute(
    executor: &Executor,
    run_id: Uuid,
    actor_id: &str,
) -> Result<RollbackRecord, ExecutorError> {
    let run = executor
        .store()
        .get_run(run_id)
        .await?
        .ok_or(ExecutorError::RunNotFound { run_id })?;

    if !run.is_rollbackable() {
        let reason = if run.dry_run {
            "dry-run runs have no effects to reverse"
        } else if run.status == RunStatus::RolledBack {
            "run was already rolled back"
        } else {
            "only succeeded runs can be rolled back"
        };
        return Err(ExecutorError::NotRollbackable {
            run_id,
            reason: reason.to_string(),
        });
    }

    // A run without its plan or connection is a store integrity failure,
    // not a caller mistake.
    let plan = executor.store().get_plan(run.plan_id).await?.ok_or(
        tether_store::StoreError::MissingRecord {
            kind: "plan",
            id: run.plan_id,
        },
    )?;
    let connection = executor
        .store()
        .get_connection(plan.connection_id)
        .await?
        .ok_or(tether_store::StoreError::MissingRecord {
            kind: "connection",
            id: plan.connection_id,
        })?;
    if !connection.is_active() {
        return Err(ExecutorError::ConnectionInactive {
            connection_id: connection.id,
        });
    }

    let connector = executor
        .registry()
        .lookup(&connection.provider)
        .ok_or_else(|| ExecutorError::UnknownProvider {
            provider: connection.provider.clone(),
        })?;

    let started_at = Utc::now();
    let mut steps = Vec::with_capacity(run.step_results.len());
    let mut reversed = 0usize;
    let mut failed = 0usize;
    let mut skipped = 0usize;

    // Reverse order: the last effect is undone first.
    for step in run.step_results.iter().rev() {
        let outcome = match &step.rollback_plan {
            Some(rollback_plan) => {
                match invoke_action(
                    &connector,
                    &connection,
                    &rollback_plan.action_id,
                    rollback_plan.input.clone(),
                )
                .await
                {
                    Ok(_) => {
                        reversed += 1;
                        RollbackStepOutcome::Reversed
                    }
                    Err(error) => {
                        failed += 1;
                        tracing::warn!(
                            run_id = %run_id,
                            action = %step.action_id,
                            error = %error,
                            "rollback step failed; continuing"
                        );
                        RollbackStepOutcome::Failed { error }
                    }
                }
            }
            None => {
                skipped += 1;
                RollbackStepOutcome::Skipped {
                    limitation: "no rollback plan recorded for this step".to_string(),
                }
            }
        };
        steps.push(RollbackStepResult {
            action_id: step.action_id.clone(),
            outcome,
        });
    }

    let record = RollbackRecord {
        id: Uuid::new_v4(),
        run_id,
        actor_id: actor_id.to_string(),
        steps,
        success: failed == 0,
        partial: failed > 0 || skipped > 0,
        started_at,
        finished_at: Utc::now(),
    };

    executor.store().create_rollback_record(record.clone()).await?;

    // The original run is marked, never rewritten.
    if record.success {
        let mut updated = run.clone();
        updated.status = RunStatus::RolledBack;
        executor.store().update_run(updated).await?;
    }

    if let Err(err) = executor
        .audit()
        .log_rollback(
            &connection.tenant_id,
            &connection.provider,
            actor_id,
            run_id,
            reversed,
            record.partial,
        )
        .await
    {
        tracing::warn!(run_id = %run_id, error = %err, "audit append failed");
    }

    Ok(record)
}
