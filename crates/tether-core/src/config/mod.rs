//! Configuration types for Tether.
//!
//! Configuration is loaded from a single YAML file (`tether.yaml`) and
//! handed to components as typed sections. Connectors receive their
//! `ProviderConfig` explicitly at construction; nothing reads the process
//! environment at module load.

pub mod audit;
pub mod provider;
pub mod server;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use audit::{AuditConfig, StorageBackend};
pub use provider::{ProviderConfig, ProvidersConfig};
pub use server::ServerConfig;

/// Complete Tether configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TetherConfig {
    /// Project name.
    #[serde(default)]
    pub project: Option<String>,

    /// Provider credential sections.
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,
}

/// Errors loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
}

impl TetherConfig {
    /// Load configuration from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load from `TETHER_CONFIG` if set and present, otherwise `tether.yaml`
    /// in the working directory, otherwise defaults (demo mode everywhere).
    pub fn from_env_or_default() -> Self {
        let candidate =
            std::env::var("TETHER_CONFIG").unwrap_or_else(|_| "tether.yaml".to_string());
        if Path::new(&candidate).exists() {
            match Self::load(&candidate) {
                Ok(config) => return config,
                Err(err) => {
                    tracing::warn!(path = %candidate, error = %err, "ignoring unreadable config");
                }
            }
        }
        Self::default()
    }
}
