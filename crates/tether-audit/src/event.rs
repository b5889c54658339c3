//! Audit event types.
//!
//! Every state-changing operation appends exactly one event: connection
//! lifecycle, discovery, plan lifecycle, execution, rollback. Events are
//! write-once; nothing in this core mutates or deletes them (retention is
//! an external policy).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // ===== Connection lifecycle =====
    ConnectionCreated,
    ConnectionRevoked,
    CapabilitiesDiscovered,

    // ===== Plan lifecycle =====
    PlanCreated,
    PlanApproved,

    // ===== Execution =====
    RunExecuted,
    RunFailed,
    RollbackExecuted,
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionCreated => write!(f, "CONNECTION_CREATED"),
            Self::ConnectionRevoked => write!(f, "CONNECTION_REVOKED"),
            Self::CapabilitiesDiscovered => write!(f, "CAPABILITIES_DISCOVERED"),
            Self::PlanCreated => write!(f, "PLAN_CREATED"),
            Self::PlanApproved => write!(f, "PLAN_APPROVED"),
            Self::RunExecuted => write!(f, "RUN_EXECUTED"),
            Self::RunFailed => write!(f, "RUN_FAILED"),
            Self::RollbackExecuted => write!(f, "ROLLBACK_EXECUTED"),
        }
    }
}

/// An audit event.
///
/// Core fields follow the format: [tenant - provider - actor - subject].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: Uuid,

    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,

    /// Event type.
    pub event_type: AuditEventType,

    /// Tenant ID.
    pub tenant_id: String,

    /// Provider the subject belongs to.
    pub provider: String,

    /// Who performed the operation.
    pub actor: String,

    // ===== Subject references =====
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,

    // ===== Execution details =====
    /// Whether this was a dry-run/preview.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,

    /// Whether the effect was simulated (demo credential).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demo_mode: Option<bool>,

    /// Number of steps touched, for execution events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_count: Option<usize>,

    /// Error message (if the event records a failure).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Additional metadata. Never credential material.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub meta: serde_json::Value,
}

impl AuditEvent {
    /// Create a new audit event with the given type and core fields.
    pub fn new(
        event_type: AuditEventType,
        tenant_id: impl Into<String>,
        provider: impl Into<String>,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event_type,
            tenant_id: tenant_id.into(),
            provider: provider.into(),
            actor: actor.into(),
            connection_id: None,
            plan_id: None,
            run_id: None,
            dry_run: None,
            demo_mode: None,
            step_count: None,
            error: None,
            meta: serde_json::Value::Null,
        }
    }

    pub fn connection_id(mut self, id: Uuid) -> Self {
        self.connection_id = Some(id);
        self
    }

    pub fn plan_id(mut self, id: Uuid) -> Self {
        self.plan_id = Some(id);
        self
    }

    pub fn run_id(mut self, id: Uuid) -> Self {
        self.run_id = Some(id);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = Some(dry_run);
        self
    }

    pub fn demo_mode(mut self, demo_mode: bool) -> Self {
        self.demo_mode = Some(demo_mode);
        self
    }

    pub fn step_count(mut self, count: usize) -> Self {
        self.step_count = Some(count);
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = meta;
        self
    }

    /// Format the event as a human-readable log line.
    pub fn log_line(&self) -> String {
        let mut line = format!(
            "[{} - {} - {} - {}]",
            self.tenant_id, self.provider, self.actor, self.event_type
        );
        if let Some(run_id) = self.run_id {
            line.push_str(&format!(" run={run_id}"));
        }
        if self.dry_run == Some(true) {
            line.push_str(" (dry-run)");
        }
        if self.demo_mode == Some(true) {
            line.push_str(" (demo)");
        }
        if let Some(error) = &self.error {
            line.push_str(&format!(" error={error}"));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_subject_references() {
        let run_id = Uuid::new_v4();
        let event = AuditEvent::new(AuditEventType::RunExecuted, "acme", "github", "user-1")
            .run_id(run_id)
            .dry_run(false)
            .demo_mode(true)
            .step_count(2);

        assert_eq!(event.run_id, Some(run_id));
        assert_eq!(event.step_count, Some(2));
        assert!(event.log_line().contains("(demo)"));
        assert!(!event.log_line().contains("(dry-run)"));
    }

    #[test]
    fn serializes_event_type_as_snake_case() {
        let event = AuditEvent::new(
            AuditEventType::CapabilitiesDiscovered,
            "acme",
            "github",
            "user-1",
        );
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["event_type"], "capabilities_discovered");
    }
}
