//! Error types for the API server.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use tether_connector::ConnectorError;
use tether_runtime::ExecutorError;
use tether_store::StoreError;

use crate::envelope::ApiResponse;

/// Errors surfaced by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown entity: provider, connection, plan, run. Never retried.
    #[error("not found: {0}")]
    NotFound(String),

    /// Validation/business-rule failure; the caller must correct the
    /// request before retrying.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Internal error (store unavailability and the like).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl From<ConnectorError> for ApiError {
    fn from(err: ConnectorError) -> Self {
        match err {
            ConnectorError::AuthExchange(_)
            | ConnectorError::Discovery(_)
            | ConnectorError::UnknownAction { .. }
            | ConnectorError::UnsupportedMode { .. }
            | ConnectorError::InvalidInput { .. }
            | ConnectorError::Provider(_) => ApiError::InvalidRequest(err.to_string()),
            ConnectorError::Serialization(e) => ApiError::Internal(e.into()),
            ConnectorError::Internal(e) => ApiError::Internal(e),
        }
    }
}

impl From<ExecutorError> for ApiError {
    fn from(err: ExecutorError) -> Self {
        match err {
            ExecutorError::RunNotFound { .. } | ExecutorError::UnknownProvider { .. } => {
                ApiError::NotFound(err.to_string())
            }
            ExecutorError::ConnectionInactive { .. }
            | ExecutorError::PlanNotExecutable { .. }
            | ExecutorError::NotRollbackable { .. } => ApiError::InvalidRequest(err.to_string()),
            ExecutorError::Store(e) => ApiError::Internal(e.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(err) => {
                // Raw internals stay out of the response body.
                tracing::error!(error = %err, "internal error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::failure("internal error")),
                )
                    .into_response();
            }
        };

        (status, Json(ApiResponse::failure(self.to_string()))).into_response()
    }
}
