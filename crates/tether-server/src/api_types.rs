//! API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tether_connector::CapabilityDiscovery;
use tether_core::{AuthLevel, Connection, ConnectionStatus, Run, StepResult};

fn default_tenant() -> String {
    "demo-tenant".to_string()
}

fn default_user() -> String {
    "demo-operator".to_string()
}

fn default_actor() -> String {
    "demo-operator".to_string()
}

fn default_session() -> String {
    "default".to_string()
}

// =============================================================================
// Connection endpoints
// =============================================================================

/// Response for `POST /connections/{provider}/start`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConnectionResponse {
    pub auth_url: String,
    pub state: String,
    pub provider: String,
}

/// Request body for `POST /connections/{provider}/callback`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackRequest {
    pub code: String,
    /// Echoed state nonce; validation against the issued nonce belongs to
    /// the session layer in front of this API.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default = "default_tenant")]
    pub tenant_id: String,
    #[serde(default = "default_user")]
    pub user_id: String,
}

/// Request body for `POST /connections/{provider}/connect` (demo
/// bootstrap).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectRequest {
    #[serde(default = "default_tenant")]
    pub tenant_id: String,
    #[serde(default = "default_user")]
    pub user_id: String,
}

impl ConnectRequest {
    pub fn demo() -> Self {
        Self {
            tenant_id: default_tenant(),
            user_id: default_user(),
        }
    }
}

/// Request body for `POST /connections/{provider}/discover`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequest {
    pub connection_id: Uuid,
}

/// Connection as exposed to callers: credential material stays out.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionView {
    pub id: Uuid,
    pub tenant_id: String,
    pub user_id: String,
    pub provider: String,
    pub account_id: String,
    pub account_name: String,
    pub auth_level: AuthLevel,
    pub scopes: Vec<String>,
    pub status: ConnectionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_discovered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<&Connection> for ConnectionView {
    fn from(c: &Connection) -> Self {
        Self {
            id: c.id,
            tenant_id: c.tenant_id.clone(),
            user_id: c.user_id.clone(),
            provider: c.provider.clone(),
            account_id: c.account_id.clone(),
            account_name: c.account_name.clone(),
            auth_level: c.auth_level,
            scopes: c.scopes.clone(),
            status: c.status,
            token_expires_at: c.token_expires_at,
            last_discovered_at: c.last_discovered_at,
            created_at: c.created_at,
        }
    }
}

/// Response for the demo bootstrap: the connection plus its first
/// discovery.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectResponse {
    pub connection: ConnectionView,
    pub capabilities: CapabilityDiscovery,
}

// =============================================================================
// Plan and run endpoints
// =============================================================================

/// Request body for `POST /plans`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    #[serde(default = "default_session")]
    pub session_id: String,
    pub connection_id: Uuid,
    pub intent: String,
}

/// Request body for `POST /runs/{id}/rollback`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollbackRequest {
    #[serde(default = "default_actor")]
    pub actor_id: String,
}

impl Default for RollbackRequest {
    fn default() -> Self {
        Self {
            actor_id: default_actor(),
        }
    }
}

/// Result envelope for dry-run and approve endpoints.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    pub run_id: Uuid,
    pub dry_run: bool,
    pub success: bool,
    pub step_results: Vec<StepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Run> for RunResponse {
    fn from(run: &Run) -> Self {
        Self {
            run_id: run.id,
            dry_run: run.dry_run,
            success: run.success,
            step_results: run.step_results.clone(),
            snapshot_id: run.snapshot_id.clone(),
            error: run.error.clone(),
        }
    }
}

// =============================================================================
// Audit endpoint
// =============================================================================

/// Query parameters for `GET /audit`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditQuery {
    #[serde(default)]
    pub tenant_id: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}
