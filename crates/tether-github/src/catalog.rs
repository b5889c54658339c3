//! Static GitHub action catalog.
//!
//! The provider-wide declared catalog, independent of any credential.
//! Capability discovery filters this list down to what a grant permits.

use tether_core::{ActionCapability, AuthLevel, ExecutionMode, RiskLevel, RollbackSupport};

// Action ids are the wire contract; handlers are resolved through the
// dispatch table, keyed by these.
pub const REPO_GET: &str = "github.repo.get";
pub const REPO_LIST: &str = "github.repo.list";
pub const ISSUE_LIST: &str = "github.issue.list";
pub const ISSUE_CREATE: &str = "github.issue.create";
pub const ISSUE_CLOSE: &str = "github.issue.close";
pub const ISSUE_REOPEN: &str = "github.issue.reopen";
pub const ISSUE_COMMENT: &str = "github.issue.comment";
pub const REPO_SET_DEFAULT_BRANCH: &str = "github.repo.set_default_branch";
pub const REPO_SET_BRANCH_PROTECTION: &str = "github.repo.set_branch_protection";
pub const REPO_ARCHIVE: &str = "github.repo.archive";

/// Scopes the connector recognizes as granting read access.
pub const READABLE_SCOPES: &[&str] = &["read:org", "public_repo", "repo"];

/// Scopes the connector recognizes as granting write access.
pub const WRITABLE_SCOPES: &[&str] = &["public_repo", "repo"];

/// The high-trust scope GitHub gates its most sensitive repository
/// operations behind. Required for every WRITE_HIGH action.
pub const HIGH_TRUST_SCOPE: &str = "repo";

fn read_action(id: &str) -> ActionCapability {
    ActionCapability {
        id: id.to_string(),
        version: "1.0.0".to_string(),
        auth_level: AuthLevel::Read,
        supported_modes: vec![
            ExecutionMode::ReadOnly,
            ExecutionMode::PlanOnly,
            ExecutionMode::Auto,
        ],
        rollback: RollbackSupport::No,
        risk: RiskLevel::Low,
        policy_constraints: vec![],
        limitations: vec![],
    }
}

fn write_action(
    id: &str,
    auth_level: AuthLevel,
    risk: RiskLevel,
    rollback: RollbackSupport,
) -> ActionCapability {
    ActionCapability {
        id: id.to_string(),
        version: "1.0.0".to_string(),
        auth_level,
        supported_modes: vec![ExecutionMode::Auto, ExecutionMode::PlanOnly],
        rollback,
        risk,
        policy_constraints: vec![],
        limitations: vec![],
    }
}

/// The full declared catalog, in stable order.
pub fn declared_actions() -> Vec<ActionCapability> {
    let mut actions = vec![
        read_action(REPO_GET),
        read_action(REPO_LIST),
        read_action(ISSUE_LIST),
        write_action(
            ISSUE_CREATE,
            AuthLevel::WriteLow,
            RiskLevel::Low,
            RollbackSupport::Yes,
        ),
        write_action(
            ISSUE_CLOSE,
            AuthLevel::WriteLow,
            RiskLevel::Low,
            RollbackSupport::Yes,
        ),
        write_action(
            ISSUE_REOPEN,
            AuthLevel::WriteLow,
            RiskLevel::Low,
            RollbackSupport::Yes,
        ),
        write_action(
            ISSUE_COMMENT,
            AuthLevel::WriteLow,
            RiskLevel::Low,
            RollbackSupport::No,
        ),
        write_action(
            REPO_SET_DEFAULT_BRANCH,
            AuthLevel::WriteHigh,
            RiskLevel::Med,
            RollbackSupport::Yes,
        ),
        write_action(
            REPO_SET_BRANCH_PROTECTION,
            AuthLevel::WriteHigh,
            RiskLevel::High,
            RollbackSupport::Yes,
        ),
        write_action(
            REPO_ARCHIVE,
            AuthLevel::WriteHigh,
            RiskLevel::High,
            RollbackSupport::Yes,
        ),
    ];

    for action in &mut actions {
        match action.auth_level {
            AuthLevel::Read => {}
            AuthLevel::WriteLow => {
                action
                    .limitations
                    .push("requires a scope with write access (public_repo or repo)".to_string());
            }
            AuthLevel::WriteHigh => {
                action
                    .limitations
                    .push(format!("requires the {HIGH_TRUST_SCOPE} scope"));
                action
                    .policy_constraints
                    .push("requires approval for MED+ risk".to_string());
            }
        }
        if action.id == ISSUE_COMMENT {
            action
                .limitations
                .push("comments cannot be rolled back".to_string());
        }
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_ids_are_provider_namespaced() {
        for action in declared_actions() {
            assert!(action.id.starts_with("github."), "{}", action.id);
            assert_eq!(action.id.split('.').count(), 3, "{}", action.id);
        }
    }

    #[test]
    fn branch_protection_is_write_high_and_high_risk() {
        let catalog = declared_actions();
        let action = catalog
            .iter()
            .find(|a| a.id == REPO_SET_BRANCH_PROTECTION)
            .unwrap();
        assert_eq!(action.auth_level, AuthLevel::WriteHigh);
        assert_eq!(action.risk, RiskLevel::High);
        assert_eq!(action.rollback, RollbackSupport::Yes);
    }

    #[test]
    fn read_actions_support_read_only_mode() {
        for action in declared_actions() {
            if action.auth_level == AuthLevel::Read {
                assert!(action.supports_mode(ExecutionMode::ReadOnly), "{}", action.id);
            } else {
                assert!(!action.supports_mode(ExecutionMode::ReadOnly), "{}", action.id);
            }
            assert!(action.supports_mode(ExecutionMode::PlanOnly), "{}", action.id);
        }
    }
}
