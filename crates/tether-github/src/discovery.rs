//! Scope classification and catalog filtering.
//!
//! Discovery rules: a READ action is always included; a WRITE_LOW action
//! requires at least one writable scope; a WRITE_HIGH action requires the
//! high-trust `repo` scope. Never returns an action the granted scopes
//! cannot justify.

use tether_core::{ActionCapability, AuthLevel};

use crate::catalog::{HIGH_TRUST_SCOPE, READABLE_SCOPES, WRITABLE_SCOPES};

/// Granted scopes split into the categories the capability model cares
/// about.
#[derive(Debug, Clone)]
pub struct ScopeClassification {
    pub readable: Vec<String>,
    pub writable: Vec<String>,
    pub missing: Vec<String>,
}

pub fn classify_scopes(granted: &[String]) -> ScopeClassification {
    let has = |scope: &str| granted.iter().any(|g| g == scope);

    ScopeClassification {
        readable: READABLE_SCOPES
            .iter()
            .filter(|s| has(s))
            .map(|s| s.to_string())
            .collect(),
        writable: WRITABLE_SCOPES
            .iter()
            .filter(|s| has(s))
            .map(|s| s.to_string())
            .collect(),
        missing: READABLE_SCOPES
            .iter()
            .filter(|s| !has(s))
            .map(|s| s.to_string())
            .collect(),
    }
}

/// The granted ceiling implied by a scope set.
pub fn granted_auth_level(granted: &[String]) -> AuthLevel {
    if granted.iter().any(|s| s == HIGH_TRUST_SCOPE) {
        AuthLevel::WriteHigh
    } else if classify_scopes(granted).writable.is_empty() {
        AuthLevel::Read
    } else {
        AuthLevel::WriteLow
    }
}

/// Whether a single action is justified by the granted scopes.
pub fn scopes_permit(action: &ActionCapability, granted: &[String]) -> bool {
    match action.auth_level {
        AuthLevel::Read => true,
        AuthLevel::WriteLow => !classify_scopes(granted).writable.is_empty(),
        AuthLevel::WriteHigh => granted.iter().any(|s| s == HIGH_TRUST_SCOPE),
    }
}

/// Filter the declared catalog down to what the grant permits, preserving
/// catalog order.
pub fn filter_catalog(catalog: Vec<ActionCapability>, granted: &[String]) -> Vec<ActionCapability> {
    catalog
        .into_iter()
        .filter(|action| scopes_permit(action, granted))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{declared_actions, REPO_SET_BRANCH_PROTECTION};

    fn granted(scopes: &[&str]) -> Vec<String> {
        scopes.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn read_only_grant_excludes_write_high_actions() {
        let scopes = granted(&["read:org"]);
        let actions = filter_catalog(declared_actions(), &scopes);

        assert!(actions.iter().all(|a| a.auth_level == AuthLevel::Read));
        assert!(!actions.iter().any(|a| a.id == REPO_SET_BRANCH_PROTECTION));

        let classification = classify_scopes(&scopes);
        assert!(classification.missing.contains(&"repo".to_string()));
        assert_eq!(granted_auth_level(&scopes), AuthLevel::Read);
    }

    #[test]
    fn public_repo_grant_unlocks_write_low_but_not_write_high() {
        let scopes = granted(&["public_repo"]);
        let actions = filter_catalog(declared_actions(), &scopes);

        assert!(actions.iter().any(|a| a.auth_level == AuthLevel::WriteLow));
        assert!(!actions.iter().any(|a| a.auth_level == AuthLevel::WriteHigh));
        assert_eq!(granted_auth_level(&scopes), AuthLevel::WriteLow);
    }

    #[test]
    fn repo_scope_unlocks_the_full_catalog() {
        let scopes = granted(&["repo"]);
        let actions = filter_catalog(declared_actions(), &scopes);
        assert_eq!(actions.len(), declared_actions().len());
        assert_eq!(granted_auth_level(&scopes), AuthLevel::WriteHigh);
    }

    #[test]
    fn every_returned_action_is_scope_justified() {
        for scopes in [
            granted(&[]),
            granted(&["read:org"]),
            granted(&["public_repo"]),
            granted(&["read:org", "repo"]),
        ] {
            for action in filter_catalog(declared_actions(), &scopes) {
                assert!(scopes_permit(&action, &scopes), "{}", action.id);
            }
        }
    }
}
