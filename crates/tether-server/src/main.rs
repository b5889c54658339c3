use tether_core::TetherConfig;
use tether_server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = TetherConfig::from_env_or_default();
    let state = AppState::init(config)?;
    tether_server::serve(state).await
}
