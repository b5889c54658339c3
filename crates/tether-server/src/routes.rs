//! Route definitions.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/providers", get(handlers::list_providers))
        .route(
            "/connections/{provider}/start",
            post(handlers::start_connection),
        )
        .route(
            "/connections/{provider}/callback",
            post(handlers::oauth_callback),
        )
        .route(
            "/connections/{provider}/connect",
            post(handlers::demo_connect),
        )
        .route("/connections/{provider}/discover", post(handlers::discover))
        .route(
            "/connections/{provider}/disconnect",
            post(handlers::disconnect),
        )
        .route("/plans", post(handlers::create_plan))
        .route("/plans/{id}", get(handlers::get_plan))
        .route("/plans/{id}/dry-run", post(handlers::dry_run_plan))
        .route("/plans/{id}/approve", post(handlers::approve_plan))
        .route("/runs/{id}", get(handlers::get_run))
        .route("/runs/{id}/rollback", post(handlers::rollback_run))
        .route("/audit", get(handlers::audit_events))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
