//! Reference GitHub connector.
//!
//! Implements the connector contract against GitHub's REST API, with a
//! simulated in-memory backend for demo mode. The action id string is the
//! wire contract; internally every id resolves once through a dispatch
//! table built at construction.

pub mod actions;
pub mod api;
pub mod catalog;
pub mod discovery;
pub mod oauth;
pub mod simulated;

use std::collections::HashMap;

use async_trait::async_trait;

use tether_connector::{
    ActionRequest, ActionResult, CapabilityDiscovery, Connector, ConnectorError, CredentialKind,
    HandlerTable, IssuedCredential, ProviderMetadata,
};
use tether_core::{ActionCapability, AuthLevel, ExecutionMode, ProviderConfig};

use crate::api::GithubApi;
use crate::simulated::{SimulatedGithub, DEMO_ACCOUNT_ID, DEMO_ACCOUNT_NAME, DEMO_SCOPES};

pub struct GithubConnector {
    config: ProviderConfig,
    http: reqwest::Client,
    api: GithubApi,
    sim: SimulatedGithub,
    handlers: HandlerTable<GithubConnector>,
    catalog_index: HashMap<String, ActionCapability>,
}

impl GithubConnector {
    /// Construct from explicit configuration. An unconfigured app (no
    /// client secret) serves demo mode only.
    pub fn new(config: ProviderConfig) -> Self {
        let api = GithubApi::new(config.api_base.as_deref());
        let catalog_index = catalog::declared_actions()
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();
        Self {
            config,
            http: reqwest::Client::new(),
            api,
            sim: SimulatedGithub::new(),
            handlers: actions::handler_table(),
            catalog_index,
        }
    }

    /// A connector serving only the demo path.
    pub fn demo() -> Self {
        Self::new(ProviderConfig::default())
    }

    pub(crate) fn api(&self) -> &GithubApi {
        &self.api
    }

    /// The demo backend, exposed for state inspection in demos and tests.
    pub fn simulated(&self) -> &SimulatedGithub {
        &self.sim
    }

    /// The mode an invocation resolves to, for validation against the
    /// capability's supported modes.
    fn requested_mode(capability: &ActionCapability, dry_run: bool) -> ExecutionMode {
        if dry_run {
            ExecutionMode::PlanOnly
        } else if capability.auth_level == AuthLevel::Read {
            ExecutionMode::ReadOnly
        } else {
            ExecutionMode::Auto
        }
    }
}

#[async_trait]
impl Connector for GithubConnector {
    fn provider(&self) -> &str {
        "github"
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "github".to_string(),
            display_name: "GitHub".to_string(),
            description: "Repositories, issues, and branch protection".to_string(),
        }
    }

    fn generate_authorization_url(&self, state: &str) -> String {
        oauth::authorization_url(&self.config, state)
    }

    async fn exchange_code(&self, code: &str) -> Result<IssuedCredential, ConnectorError> {
        oauth::exchange_code(&self.config, &self.http, code).await
    }

    fn declared_actions(&self) -> Vec<ActionCapability> {
        catalog::declared_actions()
    }

    async fn discover_capabilities(
        &self,
        access_token: &str,
    ) -> Result<CapabilityDiscovery, ConnectorError> {
        let (account_id, account_name, scopes, demo_mode) =
            match CredentialKind::classify(access_token) {
                CredentialKind::Demo => (
                    DEMO_ACCOUNT_ID.to_string(),
                    DEMO_ACCOUNT_NAME.to_string(),
                    DEMO_SCOPES.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
                    true,
                ),
                CredentialKind::Live => {
                    let identity = self.api.identity(access_token).await?;
                    (
                        identity.account_id,
                        identity.account_name,
                        identity.scopes,
                        false,
                    )
                }
            };

        let classification = discovery::classify_scopes(&scopes);
        let actions = discovery::filter_catalog(catalog::declared_actions(), &scopes);

        tracing::debug!(
            provider = "github",
            account = %account_name,
            actions = actions.len(),
            demo = demo_mode,
            "capability discovery"
        );

        Ok(CapabilityDiscovery {
            provider: "github".to_string(),
            account_id,
            account_name,
            auth_level: discovery::granted_auth_level(&scopes),
            scopes,
            actions,
            readable_scopes: classification.readable,
            writable_scopes: classification.writable,
            missing_scopes: classification.missing,
            demo_mode,
        })
    }

    async fn execute_action(
        &self,
        action_id: &str,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError> {
        let capability =
            self.catalog_index
                .get(action_id)
                .ok_or_else(|| ConnectorError::UnknownAction {
                    action_id: action_id.to_string(),
                })?;

        let mode = Self::requested_mode(capability, request.dry_run);
        if !capability.supports_mode(mode) {
            return Err(ConnectorError::UnsupportedMode {
                action_id: action_id.to_string(),
                mode: mode.to_string(),
            });
        }

        self.handlers.dispatch(self, action_id, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tether_connector::ActionContext;
    use uuid::Uuid;

    fn request(token: &str, input: serde_json::Value, dry_run: bool) -> ActionRequest {
        ActionRequest {
            context: ActionContext {
                connection_id: Uuid::new_v4(),
                tenant_id: "acme".to_string(),
                access_token: token.to_string(),
            },
            input,
            dry_run,
        }
    }

    async fn demo_token(connector: &GithubConnector) -> String {
        connector
            .exchange_code(oauth::DEMO_CODE)
            .await
            .unwrap()
            .access_token
    }

    #[tokio::test]
    async fn demo_discovery_returns_full_catalog() {
        let connector = GithubConnector::demo();
        let token = demo_token(&connector).await;

        let discovery = connector.discover_capabilities(&token).await.unwrap();
        assert!(discovery.demo_mode);
        assert_eq!(discovery.auth_level, AuthLevel::WriteHigh);
        assert_eq!(discovery.actions.len(), catalog::declared_actions().len());
        assert!(discovery.missing_scopes.is_empty());
    }

    #[tokio::test]
    async fn unknown_action_is_rejected_before_dispatch() {
        let connector = GithubConnector::demo();
        let token = demo_token(&connector).await;

        let err = connector
            .execute_action("github.repo.explode", request(&token, json!({}), false))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::UnknownAction { .. }));
    }

    #[tokio::test]
    async fn branch_protection_dry_run_is_plan_only_with_snapshot() {
        let connector = GithubConnector::demo();
        let token = demo_token(&connector).await;
        let input = json!({
            "repo": "acme/website",
            "branch": "main",
            "protection": { "requiredReviews": 2, "enforceAdmins": true }
        });

        let preview = connector
            .execute_action(
                catalog::REPO_SET_BRANCH_PROTECTION,
                request(&token, input.clone(), true),
            )
            .await
            .unwrap();

        assert_eq!(preview.execution_mode, ExecutionMode::PlanOnly);
        // Pre-change state: the branch is unprotected.
        let snapshot = preview.snapshot.expect("snapshot must be present");
        assert_eq!(snapshot["protection"], serde_json::Value::Null);
        assert!(preview.rollback_plan.is_none());
        assert_eq!(preview.evidence["demoMode"], true);

        // Preview performed zero mutations.
        assert!(connector
            .simulated()
            .get_protection("acme/website", "main")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn real_run_records_rollback_that_restores_pre_state() {
        let connector = GithubConnector::demo();
        let token = demo_token(&connector).await;
        let input = json!({
            "repo": "acme/website",
            "branch": "main",
            "protection": { "requiredReviews": 2, "enforceAdmins": true }
        });

        let applied = connector
            .execute_action(
                catalog::REPO_SET_BRANCH_PROTECTION,
                request(&token, input, false),
            )
            .await
            .unwrap();

        assert!(connector
            .simulated()
            .get_protection("acme/website", "main")
            .unwrap()
            .is_some());

        // Replay the recorded rollback plan through the same entry point.
        let rollback = applied.rollback_plan.expect("rollback plan must be present");
        assert_eq!(rollback.action_id, catalog::REPO_SET_BRANCH_PROTECTION);
        connector
            .execute_action(&rollback.action_id, request(&token, rollback.input, false))
            .await
            .unwrap();

        assert!(connector
            .simulated()
            .get_protection("acme/website", "main")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn issue_create_rolls_back_by_closing() {
        let connector = GithubConnector::demo();
        let token = demo_token(&connector).await;

        let created = connector
            .execute_action(
                catalog::ISSUE_CREATE,
                request(
                    &token,
                    json!({ "repo": "acme/api", "title": "Rotate deploy key" }),
                    false,
                ),
            )
            .await
            .unwrap();

        let rollback = created.rollback_plan.expect("create must be rollbackable");
        assert_eq!(rollback.action_id, catalog::ISSUE_CLOSE);

        connector
            .execute_action(&rollback.action_id, request(&token, rollback.input.clone(), false))
            .await
            .unwrap();

        let number = rollback.input["number"].as_u64().unwrap();
        let issue = connector.simulated().get_issue("acme/api", number).unwrap();
        assert_eq!(issue.state, "closed");
    }

    #[tokio::test]
    async fn missing_input_is_invalid_not_a_panic() {
        let connector = GithubConnector::demo();
        let token = demo_token(&connector).await;

        let err = connector
            .execute_action(catalog::REPO_GET, request(&token, json!({}), false))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectorError::InvalidInput { .. }));
    }
}
