//! HTTP API layer.
//!
//! Thin transport over the core: routing, the response envelope, and
//! request/response DTOs. Every state-changing endpoint delegates to the
//! planner/executor/store and appends audit events; no business rule lives
//! here.

pub mod api_types;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;

/// Bind and serve until shutdown.
pub async fn serve(state: std::sync::Arc<AppState>) -> anyhow::Result<()> {
    let addr = state.config.server.bind.clone();
    let app = create_router(state);

    tracing::info!("tether-server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
