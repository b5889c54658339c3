//! Response envelope.
//!
//! Every response is wrapped `{success, data | error, traceId}` so callers
//! never see raw internals.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub trace_id: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            trace_id: new_trace_id(),
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            trace_id: new_trace_id(),
        }
    }
}

fn new_trace_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// 200 with a wrapped payload.
pub fn ok<T: Serialize>(data: T) -> Response {
    Json(ApiResponse::success(data)).into_response()
}

/// 201 with a wrapped payload, for resource creation.
pub fn created<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(ApiResponse::success(data))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_carries_data_and_trace_id() {
        let envelope = ApiResponse::success(serde_json::json!({"x": 1}));
        let v = serde_json::to_value(&envelope).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["data"]["x"], 1);
        assert!(v.get("error").is_none());
        assert!(!v["traceId"].as_str().unwrap().is_empty());
    }

    #[test]
    fn failure_envelope_carries_error() {
        let envelope = ApiResponse::failure("plan not found");
        let v = serde_json::to_value(&envelope).unwrap();
        assert_eq!(v["success"], false);
        assert_eq!(v["error"], "plan not found");
    }
}
