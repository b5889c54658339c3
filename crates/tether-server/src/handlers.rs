//! API handlers.
//!
//! Thin transport glue: handlers parse the request, call the core
//! (connectors, planner, executor, store, audit), and wrap the outcome in
//! the response envelope. Business rules live below this layer.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use chrono::Utc;
use uuid::Uuid;

use tether_audit::AuditFilter;
use tether_connector::{generate_state, CapabilityDiscovery, Connector};
use tether_core::{CapabilityProfile, Connection, ConnectionStatus};
use tether_planner::{PlanOutcome, PlannerContext};

use crate::api_types::{
    AuditQuery, CallbackRequest, ConnectRequest, ConnectResponse, ConnectionView,
    CreatePlanRequest, DiscoverRequest, RollbackRequest, RunResponse, StartConnectionResponse,
};
use crate::envelope::{created, ok};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true, "service": "tether-server" }))
}

// =============================================================================
// Providers and connections
// =============================================================================

pub async fn list_providers(State(state): State<Arc<AppState>>) -> Response {
    ok(state.registry.list_available())
}

fn lookup_connector(
    state: &AppState,
    provider: &str,
) -> Result<Arc<dyn Connector>, ApiError> {
    state
        .registry
        .lookup(provider)
        .ok_or_else(|| ApiError::NotFound(format!("unknown provider: {provider}")))
}

pub async fn start_connection(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
) -> Result<Response, ApiError> {
    let connector = lookup_connector(&state, &provider)?;
    let oauth_state = generate_state();
    let auth_url = connector.generate_authorization_url(&oauth_state);

    Ok(created(StartConnectionResponse {
        auth_url,
        state: oauth_state,
        provider,
    }))
}

/// Shared by callback and demo bootstrap: exchange the code, discover
/// capabilities, persist the connection and its first profile.
async fn establish_connection(
    state: &AppState,
    provider: &str,
    code: &str,
    tenant_id: String,
    user_id: String,
) -> Result<(Connection, CapabilityDiscovery), ApiError> {
    let connector = lookup_connector(state, provider)?;

    let credential = connector.exchange_code(code).await?;
    let discovery = connector
        .discover_capabilities(&credential.access_token)
        .await?;

    let connection = Connection {
        id: Uuid::new_v4(),
        tenant_id,
        user_id,
        provider: provider.to_string(),
        account_id: discovery.account_id.clone(),
        account_name: discovery.account_name.clone(),
        auth_level: discovery.auth_level,
        scopes: discovery.scopes.clone(),
        status: ConnectionStatus::Active,
        access_token: credential.access_token,
        refresh_token: credential.refresh_token,
        token_expires_at: credential.expires_at,
        last_discovered_at: Some(Utc::now()),
        created_at: Utc::now(),
    };

    state.store.create_connection(connection.clone()).await?;
    state
        .store
        .create_capability_profile(discovery.to_profile(connection.id))
        .await?;

    if let Err(err) = state
        .audit
        .log_connection_created(
            &connection.tenant_id,
            provider,
            &connection.user_id,
            connection.id,
            credential.demo_mode,
        )
        .await
    {
        tracing::warn!(error = %err, "audit append failed");
    }
    if let Err(err) = state
        .audit
        .log_capabilities_discovered(
            &connection.tenant_id,
            provider,
            &connection.user_id,
            connection.id,
            discovery.actions.len(),
            discovery.demo_mode,
        )
        .await
    {
        tracing::warn!(error = %err, "audit append failed");
    }

    Ok((connection, discovery))
}

pub async fn oauth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Json(body): Json<CallbackRequest>,
) -> Result<Response, ApiError> {
    let (connection, _) = establish_connection(
        &state,
        &provider,
        &body.code,
        body.tenant_id,
        body.user_id,
    )
    .await?;
    Ok(created(ConnectionView::from(&connection)))
}

pub async fn demo_connect(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    body: Option<Json<ConnectRequest>>,
) -> Result<Response, ApiError> {
    let Json(body) = body.unwrap_or_else(|| Json(ConnectRequest::demo()));
    let (connection, capabilities) =
        establish_connection(&state, &provider, "demo", body.tenant_id, body.user_id).await?;
    Ok(created(ConnectResponse {
        connection: ConnectionView::from(&connection),
        capabilities,
    }))
}

pub async fn discover(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Json(body): Json<DiscoverRequest>,
) -> Result<Response, ApiError> {
    let mut connection = state
        .store
        .get_connection(body.connection_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("connection not found: {}", body.connection_id)))?;
    if connection.provider != provider {
        return Err(ApiError::InvalidRequest(format!(
            "connection {} belongs to provider {}",
            connection.id, connection.provider
        )));
    }
    if !connection.is_active() {
        return Err(ApiError::InvalidRequest(format!(
            "connection {} is not active",
            connection.id
        )));
    }

    let connector = lookup_connector(&state, &provider)?;
    let discovery = connector
        .discover_capabilities(&connection.access_token)
        .await?;

    // Discovery refines the granted ceiling every time it runs.
    connection.auth_level = discovery.auth_level;
    connection.scopes = discovery.scopes.clone();
    connection.last_discovered_at = Some(Utc::now());
    state.store.update_connection(connection.clone()).await?;

    let profile: CapabilityProfile = discovery.to_profile(connection.id);
    state.store.create_capability_profile(profile.clone()).await?;

    if let Err(err) = state
        .audit
        .log_capabilities_discovered(
            &connection.tenant_id,
            &provider,
            &connection.user_id,
            connection.id,
            profile.actions.len(),
            discovery.demo_mode,
        )
        .await
    {
        tracing::warn!(error = %err, "audit append failed");
    }

    Ok(ok(profile))
}

pub async fn disconnect(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    Json(body): Json<DiscoverRequest>,
) -> Result<Response, ApiError> {
    let id = body.connection_id;
    let mut connection = state
        .store
        .get_connection(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("connection not found: {id}")))?;
    if connection.provider != provider {
        return Err(ApiError::InvalidRequest(format!(
            "connection {} belongs to provider {}",
            connection.id, connection.provider
        )));
    }

    connection.revoke();
    state.store.update_connection(connection.clone()).await?;

    if let Err(err) = state
        .audit
        .log_connection_revoked(
            &connection.tenant_id,
            &connection.provider,
            &connection.user_id,
            connection.id,
        )
        .await
    {
        tracing::warn!(error = %err, "audit append failed");
    }

    Ok(ok(ConnectionView::from(&connection)))
}

// =============================================================================
// Plans
// =============================================================================

pub async fn create_plan(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreatePlanRequest>,
) -> Result<Response, ApiError> {
    let connection = state
        .store
        .get_connection(body.connection_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("connection not found: {}", body.connection_id))
        })?;
    let profile = state
        .store
        .get_capability_profile(connection.id)
        .await?;

    let context = PlannerContext {
        session_id: body.session_id,
        connection: Some(connection.clone()),
        profile,
    };

    match state.planner.generate_plan(&body.intent, &context) {
        PlanOutcome::Plan(plan) => {
            state.store.create_plan(plan.clone()).await?;
            if let Err(err) = state
                .audit
                .log_plan_created(
                    &connection.tenant_id,
                    &connection.provider,
                    &connection.user_id,
                    plan.id,
                    plan.steps.len(),
                )
                .await
            {
                tracing::warn!(error = %err, "audit append failed");
            }
            Ok(created(plan))
        }
        PlanOutcome::NoConnection => Err(ApiError::InvalidRequest(
            "no active connection with a capability profile; connect and discover first"
                .to_string(),
        )),
        PlanOutcome::NoMatch => Err(ApiError::InvalidRequest(
            "no plan template matches the request".to_string(),
        )),
        PlanOutcome::InsufficientPermissions {
            granted,
            missing_actions,
        } => Err(ApiError::InvalidRequest(format!(
            "insufficient permissions (granted {granted:?}): reconnect with more scope to use {}",
            missing_actions.join(", ")
        ))),
    }
}

pub async fn get_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let plan = state
        .store
        .get_plan(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("plan not found: {id}")))?;
    Ok(ok(plan))
}

/// Load a plan and the connection it was authored for.
async fn plan_with_connection(
    state: &AppState,
    plan_id: Uuid,
) -> Result<(tether_core::Plan, Connection), ApiError> {
    let plan = state
        .store
        .get_plan(plan_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("plan not found: {plan_id}")))?;
    let connection = state
        .store
        .get_connection(plan.connection_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("connection not found: {}", plan.connection_id))
        })?;
    Ok((plan, connection))
}

pub async fn dry_run_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (plan, connection) = plan_with_connection(&state, id).await?;
    let run = state.executor.execute_plan(&plan, &connection, true).await?;
    Ok(ok(RunResponse::from(&run)))
}

pub async fn approve_plan(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let (mut plan, connection) = plan_with_connection(&state, id).await?;

    plan.approve()
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    state.store.update_plan(plan.clone()).await?;
    if let Err(err) = state
        .audit
        .log_plan_approved(
            &connection.tenant_id,
            &connection.provider,
            &connection.user_id,
            plan.id,
        )
        .await
    {
        tracing::warn!(error = %err, "audit append failed");
    }

    let run = state
        .executor
        .execute_plan(&plan, &connection, false)
        .await?;
    Ok(ok(RunResponse::from(&run)))
}

// =============================================================================
// Runs
// =============================================================================

pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let run = state
        .store
        .get_run(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("run not found: {id}")))?;
    Ok(ok(run))
}

pub async fn rollback_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Option<Json<RollbackRequest>>,
) -> Result<Response, ApiError> {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let record = state.executor.execute_rollback(id, &body.actor_id).await?;
    Ok(ok(record))
}

// =============================================================================
// Audit
// =============================================================================

pub async fn audit_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuditQuery>,
) -> Result<Response, ApiError> {
    let events = state
        .audit
        .query(AuditFilter {
            tenant_id: query.tenant_id,
            limit: Some(query.limit.unwrap_or(50)),
            ..Default::default()
        })
        .await
        .map_err(|e| ApiError::Internal(e.into()))?;
    Ok(ok(events))
}
