use std::path::PathBuf;

use tether_core::TetherConfig;
use tether_server::AppState;

pub async fn run(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = match config_path {
        Some(path) => TetherConfig::load(&path)?,
        None => TetherConfig::from_env_or_default(),
    };

    let state = AppState::init(config)?;
    tether_server::serve(state).await
}
