//! Plan types.
//!
//! A plan is an ordered, named sequence of action invocations with a
//! declared outcome envelope: aggregate risk, rollbackability, and whether
//! operator confirmation is required before a real run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::capability::{ActionCapability, AuthLevel, ExecutionMode, RiskLevel, RollbackSupport};

/// Whether the whole plan can be rolled back after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Rollbackability {
    /// Every mutating step declares rollback support.
    Yes,
    /// Some mutating steps declare rollback support.
    Partial,
    /// No mutating step declares rollback support.
    No,
}

/// Lifecycle status of a plan. Monotonic: no regression once executed or
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    Draft,
    Approved,
    Executed,
    Failed,
}

impl PlanStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Executed | PlanStatus::Failed)
    }
}

/// One step of a plan: an action id plus its input. Order is execution
/// order; the executor never reorders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    pub action_id: String,
    pub input: serde_json::Value,
}

/// An ordered, named sequence of action invocations authored for a
/// specific connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: Uuid,
    pub session_id: String,
    pub connection_id: Uuid,
    pub title: String,
    pub description: String,

    pub steps: Vec<PlanStep>,

    /// Maximum `risk` among constituent actions.
    pub risk_level: RiskLevel,

    /// The mode the plan was authored for.
    pub execution_mode: ExecutionMode,

    pub rollbackability: Rollbackability,

    /// Declarative summaries for UI/approval display.
    #[serde(default)]
    pub required_permissions: Vec<String>,
    #[serde(default)]
    pub affected_resources: Vec<String>,

    pub status: PlanStatus,

    /// True when `risk_level` is MED or HIGH, or any step requires
    /// WRITE_HIGH authorization.
    pub confirm_required: bool,

    pub created_at: DateTime<Utc>,
}

/// Attempted status regression on a plan.
#[derive(Debug, Error)]
#[error("invalid plan status transition: {from:?} -> {to:?}")]
pub struct InvalidPlanTransition {
    pub from: PlanStatus,
    pub to: PlanStatus,
}

impl Plan {
    /// Approve a draft plan.
    pub fn approve(&mut self) -> Result<(), InvalidPlanTransition> {
        self.transition(PlanStatus::Approved)
    }

    /// Record a successful real execution.
    pub fn mark_executed(&mut self) -> Result<(), InvalidPlanTransition> {
        self.transition(PlanStatus::Executed)
    }

    /// Record a failed real execution.
    pub fn mark_failed(&mut self) -> Result<(), InvalidPlanTransition> {
        self.transition(PlanStatus::Failed)
    }

    fn transition(&mut self, to: PlanStatus) -> Result<(), InvalidPlanTransition> {
        let allowed = match (self.status, to) {
            (PlanStatus::Draft, PlanStatus::Approved) => true,
            (PlanStatus::Approved, PlanStatus::Executed) => true,
            (PlanStatus::Approved, PlanStatus::Failed) => true,
            _ => false,
        };
        if !allowed {
            return Err(InvalidPlanTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

/// Compute the aggregate risk of a resolved step set.
pub fn aggregate_risk(capabilities: &[&ActionCapability]) -> RiskLevel {
    capabilities
        .iter()
        .map(|c| c.risk)
        .max()
        .unwrap_or(RiskLevel::Low)
}

/// Compute whole-plan rollbackability from the resolved step set.
///
/// Read-only steps are ignored; `Yes` requires every mutating step to
/// declare rollback support.
pub fn aggregate_rollbackability(capabilities: &[&ActionCapability]) -> Rollbackability {
    let mutating: Vec<_> = capabilities.iter().filter(|c| c.is_mutating()).collect();
    if mutating.is_empty() {
        return Rollbackability::Yes;
    }
    let supported = mutating
        .iter()
        .filter(|c| c.rollback == RollbackSupport::Yes)
        .count();
    if supported == mutating.len() {
        Rollbackability::Yes
    } else if supported > 0 {
        Rollbackability::Partial
    } else {
        Rollbackability::No
    }
}

/// Confirmation rule: MED+ aggregate risk, or any WRITE_HIGH step.
pub fn confirm_required(risk: RiskLevel, capabilities: &[&ActionCapability]) -> bool {
    risk >= RiskLevel::Med
        || capabilities
            .iter()
            .any(|c| c.auth_level == AuthLevel::WriteHigh)
}
