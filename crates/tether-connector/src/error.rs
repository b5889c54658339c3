//! Error types for the connector contract.

use thiserror::Error;

/// Errors that can occur inside a connector.
///
/// These never escape the executor's step boundary: the executor folds them
/// into the failing step's result.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The provider rejected an authorization code exchange.
    #[error("authorization code exchange failed: {0}")]
    AuthExchange(String),

    /// The credential could not be validated during discovery
    /// (expired/revoked).
    #[error("capability discovery failed: {0}")]
    Discovery(String),

    /// The action id is not in the connector's declared catalog.
    #[error("unknown action: {action_id}")]
    UnknownAction { action_id: String },

    /// The requested execution mode is not in the action's supported modes.
    #[error("action {action_id} does not support {mode} execution")]
    UnsupportedMode { action_id: String, mode: String },

    /// The action input failed validation.
    #[error("invalid input for {action_id}: {reason}")]
    InvalidInput { action_id: String, reason: String },

    /// Non-2xx response from the provider during a real call.
    #[error("provider request failed: {0}")]
    Provider(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
