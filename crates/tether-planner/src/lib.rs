//! Intent planner.
//!
//! Turns a free-form textual intent plus an active connection context into
//! an ordered plan with a declared risk envelope. Matching is a fixed
//! template catalog; the planner never invents steps and never silently
//! drops a step the granted authorization cannot cover — it refuses the
//! whole plan instead.

pub mod templates;

use chrono::Utc;
use uuid::Uuid;

use tether_core::{
    aggregate_risk, aggregate_rollbackability, confirm_required, ActionCapability, AuthLevel,
    CapabilityProfile, Connection, Plan, PlanStatus,
};

use crate::templates::IntentFacts;

/// What the planner has to work with: the active connection and its most
/// recent capability profile.
pub struct PlannerContext {
    pub session_id: String,
    pub connection: Option<Connection>,
    pub profile: Option<CapabilityProfile>,
}

/// Outcome of a planning request.
///
/// `NoConnection` and `NoMatch` are normal outcomes the caller turns into
/// onboarding/help responses, not errors.
pub enum PlanOutcome {
    Plan(Plan),
    /// No active connection (or no discovery yet) in the context.
    NoConnection,
    /// No template matched the intent.
    NoMatch,
    /// A step would exceed the connection's granted authorization. The
    /// caller should surface "reconnect with more scope".
    InsufficientPermissions {
        granted: AuthLevel,
        missing_actions: Vec<String>,
    },
}

pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    /// Generate a plan for the intent, or report why none can be offered.
    ///
    /// Deterministic: the same intent text and context always yield the
    /// same plan shape.
    pub fn generate_plan(&self, intent: &str, context: &PlannerContext) -> PlanOutcome {
        let (connection, profile) = match (&context.connection, &context.profile) {
            (Some(c), Some(p)) if c.is_active() => (c, p),
            _ => return PlanOutcome::NoConnection,
        };

        let Some(template) = templates::match_template(intent) else {
            return PlanOutcome::NoMatch;
        };

        let facts = IntentFacts::extract(intent);
        let steps = (template.build_steps)(&facts);

        // Resolve each step against the profile; a step absent from the
        // discovered actions is one the grant does not justify.
        let mut resolved: Vec<&ActionCapability> = Vec::with_capacity(steps.len());
        let mut missing: Vec<String> = Vec::new();
        for step in &steps {
            match profile
                .actions
                .iter()
                .find(|a| a.id == step.action_id)
                .filter(|a| a.auth_level <= connection.auth_level)
            {
                Some(capability) => resolved.push(capability),
                None => missing.push(step.action_id.clone()),
            }
        }
        if !missing.is_empty() {
            tracing::debug!(
                intent,
                missing = ?missing,
                "refusing plan: steps exceed granted authorization"
            );
            return PlanOutcome::InsufficientPermissions {
                granted: connection.auth_level,
                missing_actions: missing,
            };
        }

        let risk_level = aggregate_risk(&resolved);
        let required_permissions = required_permissions(&resolved);
        let affected_resources = affected_resources(&steps);

        PlanOutcome::Plan(Plan {
            id: Uuid::new_v4(),
            session_id: context.session_id.clone(),
            connection_id: connection.id,
            title: template.title.to_string(),
            description: template.description.to_string(),
            risk_level,
            execution_mode: template.mode,
            rollbackability: aggregate_rollbackability(&resolved),
            required_permissions,
            affected_resources,
            status: PlanStatus::Draft,
            confirm_required: confirm_required(risk_level, &resolved),
            created_at: Utc::now(),
            steps,
        })
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

fn required_permissions(resolved: &[&ActionCapability]) -> Vec<String> {
    let mut permissions: Vec<String> = Vec::new();
    for capability in resolved {
        let label = match capability.auth_level {
            AuthLevel::Read => "read access",
            AuthLevel::WriteLow => "write access",
            AuthLevel::WriteHigh => "admin access (repo scope)",
        };
        if !permissions.iter().any(|p| p == label) {
            permissions.push(label.to_string());
        }
    }
    permissions
}

fn affected_resources(steps: &[tether_core::PlanStep]) -> Vec<String> {
    let mut resources: Vec<String> = Vec::new();
    for step in steps {
        if let Some(repo) = step.input["repo"].as_str() {
            if !resources.iter().any(|r| r == repo) {
                resources.push(repo.to_string());
            }
        }
    }
    resources
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::{
        ConnectionStatus, ExecutionMode, RiskLevel, Rollbackability, RollbackSupport,
    };

    fn capability(id: &str, auth: AuthLevel, risk: RiskLevel, rollback: RollbackSupport) -> ActionCapability {
        ActionCapability {
            id: id.to_string(),
            version: "1.0.0".to_string(),
            auth_level: auth,
            supported_modes: vec![ExecutionMode::Auto, ExecutionMode::PlanOnly],
            rollback,
            risk,
            policy_constraints: vec![],
            limitations: vec![],
        }
    }

    fn full_profile(connection_id: Uuid) -> CapabilityProfile {
        CapabilityProfile {
            connection_id,
            actions: vec![
                capability("github.repo.get", AuthLevel::Read, RiskLevel::Low, RollbackSupport::No),
                capability("github.issue.list", AuthLevel::Read, RiskLevel::Low, RollbackSupport::No),
                capability("github.issue.create", AuthLevel::WriteLow, RiskLevel::Low, RollbackSupport::Yes),
                capability("github.issue.close", AuthLevel::WriteLow, RiskLevel::Low, RollbackSupport::Yes),
                capability(
                    "github.repo.set_branch_protection",
                    AuthLevel::WriteHigh,
                    RiskLevel::High,
                    RollbackSupport::Yes,
                ),
            ],
            readable_capabilities: vec!["read:org".to_string()],
            write_capabilities: vec!["repo".to_string()],
            limitations: vec![],
            discovered_at: Utc::now(),
        }
    }

    fn connection(auth_level: AuthLevel) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            tenant_id: "acme".to_string(),
            user_id: "user-1".to_string(),
            provider: "github".to_string(),
            account_id: "1".to_string(),
            account_name: "acme-bot".to_string(),
            auth_level,
            scopes: vec![],
            status: ConnectionStatus::Active,
            access_token: "demo-gh-token".to_string(),
            refresh_token: None,
            token_expires_at: None,
            last_discovered_at: None,
            created_at: Utc::now(),
        }
    }

    fn context(auth_level: AuthLevel) -> PlannerContext {
        let connection = connection(auth_level);
        let profile = full_profile(connection.id);
        PlannerContext {
            session_id: "session-1".to_string(),
            connection: Some(connection),
            profile: Some(profile),
        }
    }

    #[test]
    fn no_connection_yields_no_plan() {
        let outcome = Planner::new().generate_plan(
            "protect the branch",
            &PlannerContext {
                session_id: "s".to_string(),
                connection: None,
                profile: None,
            },
        );
        assert!(matches!(outcome, PlanOutcome::NoConnection));
    }

    #[test]
    fn risk_is_the_max_over_steps() {
        let outcome =
            Planner::new().generate_plan("protect the main branch of acme/api", &context(AuthLevel::WriteHigh));
        let PlanOutcome::Plan(plan) = outcome else {
            panic!("expected a plan");
        };
        // repo.get is LOW, set_branch_protection is HIGH.
        assert_eq!(plan.risk_level, RiskLevel::High);
        assert!(plan.confirm_required);
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.affected_resources, vec!["acme/api"]);
        assert_eq!(plan.rollbackability, Rollbackability::Yes);
    }

    #[test]
    fn same_intent_same_context_is_deterministic() {
        let ctx = context(AuthLevel::WriteHigh);
        let planner = Planner::new();
        let a = planner.generate_plan("close issue #7 in acme/api", &ctx);
        let b = planner.generate_plan("close issue #7 in acme/api", &ctx);
        let (PlanOutcome::Plan(a), PlanOutcome::Plan(b)) = (a, b) else {
            panic!("expected plans");
        };
        let steps_a: Vec<_> = a.steps.iter().map(|s| (&s.action_id, &s.input)).collect();
        let steps_b: Vec<_> = b.steps.iter().map(|s| (&s.action_id, &s.input)).collect();
        assert_eq!(steps_a, steps_b);
        assert_eq!(a.title, b.title);
    }

    #[test]
    fn exceeding_the_granted_ceiling_refuses_the_whole_plan() {
        let outcome =
            Planner::new().generate_plan("protect the branch", &context(AuthLevel::WriteLow));
        let PlanOutcome::InsufficientPermissions {
            granted,
            missing_actions,
        } = outcome
        else {
            panic!("expected insufficient permissions");
        };
        assert_eq!(granted, AuthLevel::WriteLow);
        assert_eq!(missing_actions, vec!["github.repo.set_branch_protection"]);
    }

    #[test]
    fn read_only_template_plans_read_only() {
        let outcome = Planner::new().generate_plan("list issues", &context(AuthLevel::Read));
        let PlanOutcome::Plan(plan) = outcome else {
            panic!("expected a plan");
        };
        assert_eq!(plan.execution_mode, ExecutionMode::ReadOnly);
        assert!(!plan.confirm_required);
        assert_eq!(plan.risk_level, RiskLevel::Low);
    }
}
