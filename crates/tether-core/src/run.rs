//! Run types.
//!
//! A run is one execution attempt (real or dry-run) of a plan, with one
//! result entry per executed step. Runs are immutable after completion
//! except for the rollback reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::capability::ExecutionMode;

/// State machine of a run: `Pending -> Running -> {Succeeded, Failed}`,
/// with `RolledBack` as a terminal side-transition triggered independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    RolledBack,
}

/// Captured instructions sufficient to reverse a single mutating step:
/// a target action id plus its parameters, with no other context needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackPlan {
    pub action_id: String,
    pub input: serde_json::Value,
}

/// The result of executing one plan step through a connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub action_id: String,
    pub success: bool,
    pub execution_mode: ExecutionMode,

    /// Action output (projected outcome for dry-runs).
    pub output: serde_json::Value,

    /// Supporting evidence: provider responses, demo-mode markers.
    pub evidence: serde_json::Value,

    /// Pre-change state, when the action is reversible by state capture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<serde_json::Value>,

    /// Present on real runs of actions that declare rollback support.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_plan: Option<RollbackPlan>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One execution attempt of a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Run {
    pub id: Uuid,
    pub plan_id: Uuid,
    pub dry_run: bool,
    pub status: RunStatus,
    pub success: bool,

    /// Ordered, one entry per executed plan step. Steps after a failure are
    /// absent, not padded.
    pub step_results: Vec<StepResult>,

    /// Set only on failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Opaque handle to aggregated pre-state, when rollback is possible for
    /// the whole run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,

    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Run {
    /// Whether this run can be rolled back: a completed real run that has
    /// not been rolled back already.
    pub fn is_rollbackable(&self) -> bool {
        !self.dry_run && self.status == RunStatus::Succeeded
    }
}

/// Outcome of reversing one step during a rollback.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RollbackStepOutcome {
    /// The step's rollback plan executed successfully.
    Reversed,
    /// The step recorded no rollback plan; skipped with a limitation.
    Skipped { limitation: String },
    /// The reversal itself failed; remaining steps still proceed.
    Failed { error: String },
}

/// Per-step entry of a rollback record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackStepResult {
    pub action_id: String,
    #[serde(flatten)]
    pub outcome: RollbackStepOutcome,
}

/// The record of one rollback attempt against a run.
///
/// A new record every time; the original run is only marked `RolledBack`,
/// never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRecord {
    pub id: Uuid,
    pub run_id: Uuid,
    pub actor_id: String,

    /// Reverse plan order: last executed step first.
    pub steps: Vec<RollbackStepResult>,

    /// True when every step with a rollback plan was reversed.
    pub success: bool,

    /// True when at least one step was skipped or failed to reverse, so the
    /// resource may be neither fully original nor fully mutated.
    pub partial: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(dry_run: bool, status: RunStatus) -> Run {
        Run {
            id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            dry_run,
            status,
            success: status == RunStatus::Succeeded,
            step_results: vec![],
            error: None,
            snapshot_id: None,
            started_at: Utc::now(),
            finished_at: Some(Utc::now()),
        }
    }

    #[test]
    fn only_succeeded_real_runs_are_rollbackable() {
        assert!(run(false, RunStatus::Succeeded).is_rollbackable());
        assert!(!run(true, RunStatus::Succeeded).is_rollbackable());
        assert!(!run(false, RunStatus::Failed).is_rollbackable());
        assert!(!run(false, RunStatus::RolledBack).is_rollbackable());
    }

    #[test]
    fn rollback_step_outcome_serializes_with_tag() {
        let skipped = RollbackStepResult {
            action_id: "github.issue.comment".to_string(),
            outcome: RollbackStepOutcome::Skipped {
                limitation: "no rollback plan recorded".to_string(),
            },
        };
        let v = serde_json::to_value(&skipped).unwrap();
        assert_eq!(v["outcome"], "skipped");
        assert_eq!(v["limitation"], "no rollback plan recorded");
    }
}
