//! The connector contract.
//!
//! Every provider variant implements [`Connector`] identically. The
//! executor is the only caller of [`Connector::execute_action`]; connectors
//! do not retry, log, or audit on their own — they perform exactly one
//! provider interaction per call and report what happened.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tether_core::{ActionCapability, AuthLevel, ExecutionMode, RollbackPlan};

use crate::error::ConnectorError;

/// Registry-facing description of a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderMetadata {
    /// Case-sensitive provider identifier (e.g. "github").
    pub id: String,
    pub display_name: String,
    pub description: String,
}

/// Credential material returned by a code exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCredential {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// True when the credential is synthetic (demo mode). Demo access
    /// tokens are additionally prefix-tagged so they stay distinguishable
    /// at rest.
    pub demo_mode: bool,
}

/// The result of one capability discovery call against a credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDiscovery {
    pub provider: String,
    pub account_id: String,
    pub account_name: String,

    /// Granted ceiling implied by the scopes.
    pub auth_level: AuthLevel,

    /// Scopes the provider reported as granted.
    pub scopes: Vec<String>,

    /// Declared actions the grant actually permits, in catalog order.
    pub actions: Vec<ActionCapability>,

    pub readable_scopes: Vec<String>,
    pub writable_scopes: Vec<String>,
    pub missing_scopes: Vec<String>,

    /// True when the discovery ran against a synthetic credential.
    pub demo_mode: bool,
}

impl CapabilityDiscovery {
    /// Snapshot this discovery as a stored profile for a connection.
    pub fn to_profile(&self, connection_id: Uuid) -> tether_core::CapabilityProfile {
        tether_core::CapabilityProfile {
            connection_id,
            actions: self.actions.clone(),
            readable_capabilities: self.readable_scopes.clone(),
            write_capabilities: self.writable_scopes.clone(),
            limitations: self
                .missing_scopes
                .iter()
                .map(|s| format!("missing scope: {s}"))
                .collect(),
            discovered_at: Utc::now(),
        }
    }
}

/// Caller identity and credential for one action invocation.
#[derive(Debug, Clone)]
pub struct ActionContext {
    pub connection_id: Uuid,
    pub tenant_id: String,
    /// Opaque credential; never logged.
    pub access_token: String,
}

/// One action invocation.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub context: ActionContext,
    pub input: serde_json::Value,
    pub dry_run: bool,
}

/// What a single action invocation produced.
///
/// Failure is signaled through `Err(ConnectorError)`, not through this
/// type; the executor folds errors into the step result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResult {
    /// `PlanOnly` for dry-runs, the invoked mode otherwise.
    pub execution_mode: ExecutionMode,

    /// Action output; for dry-runs, the projected outcome
    /// (`wouldApply`-style preview).
    pub output: serde_json::Value,

    /// Supporting evidence (provider response summaries, `demoMode` marker).
    pub evidence: serde_json::Value,

    /// Current state captured before any change. Never absent when the
    /// action is reversible by state capture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<serde_json::Value>,

    /// Populated on real runs of actions declaring rollback support:
    /// a target action id plus parameters, sufficient on its own to
    /// reverse the effect.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rollback_plan: Option<RollbackPlan>,
}

/// Provider-specific adapter: capability metadata plus action execution.
///
/// Capability discovery is credential-scoped and time-scoped. It must be
/// re-run whenever scopes might have changed (e.g. after a reconnect) and
/// its result is never valid past one discovery cycle.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Case-sensitive provider identifier.
    fn provider(&self) -> &str;

    /// Registry-facing metadata.
    fn metadata(&self) -> ProviderMetadata;

    /// Build the provider's consent-flow entry point. Pure; never fails.
    /// Returns a best-effort demo URL when credentials are unconfigured.
    fn generate_authorization_url(&self, state: &str) -> String;

    /// Trade a one-time authorization code for credential material.
    ///
    /// In demo mode (no configured client secret, or the sentinel code),
    /// returns a synthetic, clearly-marked credential instead of calling
    /// the provider.
    async fn exchange_code(&self, code: &str) -> Result<IssuedCredential, ConnectorError>;

    /// Static, provider-wide action catalog, independent of any credential.
    fn declared_actions(&self) -> Vec<ActionCapability>;

    /// Resolve the identity and granted scopes behind a credential, filter
    /// the declared catalog down to what the grant permits, and classify
    /// granted scopes into readable/writable/missing.
    async fn discover_capabilities(
        &self,
        access_token: &str,
    ) -> Result<CapabilityDiscovery, ConnectorError>;

    /// Single execution entry point for every declared action.
    ///
    /// Validates that `action_id` is declared and the requested mode is
    /// supported. Dry-runs perform zero mutating provider calls and return
    /// `execution_mode: PlanOnly` with a preview plus current-state
    /// snapshot. Real runs of rollback-capable actions populate
    /// `rollback_plan`.
    async fn execute_action(
        &self,
        action_id: &str,
        request: ActionRequest,
    ) -> Result<ActionResult, ConnectorError>;
}

/// Generate an opaque OAuth state nonce.
pub fn generate_state() -> String {
    use base64::Engine;
    use rand::RngCore;

    let mut bytes = [0u8; 24];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_nonces_are_unique_and_url_safe() {
        let a = generate_state();
        let b = generate_state();
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }
}
