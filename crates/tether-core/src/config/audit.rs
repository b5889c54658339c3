//! Audit logging configuration.

use serde::{Deserialize, Serialize};

/// Configuration for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Whether to also echo events to stdout.
    #[serde(default)]
    pub stdout: bool,

    /// Directory for the audit log file.
    #[serde(default = "default_directory")]
    pub directory: String,

    /// Storage backend selection.
    #[serde(default)]
    pub backend: StorageBackend,
}

/// Storage backend type.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Log to stdout.
    #[default]
    Console,
    /// Append to a log file.
    File,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            stdout: false,
            directory: default_directory(),
            backend: StorageBackend::default(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_directory() -> String {
    "logs".to_string()
}
