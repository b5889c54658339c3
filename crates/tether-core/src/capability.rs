//! Action capability types.
//!
//! An `ActionCapability` describes one action a connector can perform,
//! tagged with the authorization tier it requires, its blast-radius risk,
//! and whether executing it yields rollback instructions. Authorization and
//! risk are independent axes: callers must gate on both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum authorization tier required to invoke an action.
///
/// Ordered: `Read < WriteLow < WriteHigh`, so a granted ceiling can be
/// compared with `<=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthLevel {
    Read,
    WriteLow,
    WriteHigh,
}

/// Execution mode of an action invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// Real execution: mutations are applied.
    Auto,
    /// Preview only: no mutating calls, projected outcome returned.
    PlanOnly,
    /// Pure inspection.
    ReadOnly,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "AUTO"),
            Self::PlanOnly => write!(f, "PLAN_ONLY"),
            Self::ReadOnly => write!(f, "READ_ONLY"),
        }
    }
}

/// Blast-radius classification, independent of `AuthLevel`.
///
/// Ordered for `max()` aggregation across a plan's steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Med,
    High,
}

/// Whether executing an action produces rollback instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RollbackSupport {
    Yes,
    No,
}

/// One action a connector can perform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionCapability {
    /// Stable identifier, namespaced by provider (`provider.resource.verb`).
    pub id: String,

    /// Semantic version of the action's contract.
    pub version: String,

    /// Minimum authorization tier required to invoke it.
    pub auth_level: AuthLevel,

    /// Which execution modes this action accepts.
    pub supported_modes: Vec<ExecutionMode>,

    /// Whether executing this action produces rollback instructions.
    pub rollback: RollbackSupport,

    /// Blast-radius classification.
    pub risk: RiskLevel,

    /// Human-readable gating rules, enforced by an external policy
    /// collaborator, not by the connector.
    #[serde(default)]
    pub policy_constraints: Vec<String>,

    /// Caveats (scope requirements, partial coverage).
    #[serde(default)]
    pub limitations: Vec<String>,
}

impl ActionCapability {
    /// Whether the action accepts the given mode.
    pub fn supports_mode(&self, mode: ExecutionMode) -> bool {
        self.supported_modes.contains(&mode)
    }

    /// Whether this action mutates provider state.
    pub fn is_mutating(&self) -> bool {
        self.auth_level != AuthLevel::Read
    }
}

/// The result of one capability discovery call, snapshotted per connection.
///
/// Created fresh on every discovery; superseded, never merged, by the next
/// one. Callers must not cache it past a discovery cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityProfile {
    pub connection_id: Uuid,

    /// Actions available right now, given the granted scopes.
    pub actions: Vec<ActionCapability>,

    /// Scope category names the grant can read.
    pub readable_capabilities: Vec<String>,

    /// Scope category names the grant can write.
    pub write_capabilities: Vec<String>,

    /// Missing scopes (actions they would unlock are excluded from `actions`).
    pub limitations: Vec<String>,

    pub discovered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_level_is_ordered() {
        assert!(AuthLevel::Read < AuthLevel::WriteLow);
        assert!(AuthLevel::WriteLow < AuthLevel::WriteHigh);
    }

    #[test]
    fn risk_level_max_aggregates() {
        let max = [RiskLevel::Low, RiskLevel::High, RiskLevel::Med]
            .into_iter()
            .max()
            .unwrap();
        assert_eq!(max, RiskLevel::High);
    }

    #[test]
    fn wire_format_uses_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(AuthLevel::WriteHigh).unwrap(),
            serde_json::json!("WRITE_HIGH")
        );
        assert_eq!(
            serde_json::to_value(ExecutionMode::PlanOnly).unwrap(),
            serde_json::json!("PLAN_ONLY")
        );
    }
}
