//! API surface tests over the demo credential path.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use tether_server::{create_router, AppState};

fn app() -> axum::Router {
    create_router(AppState::init_demo())
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = match body {
        Some(body) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn healthz_is_unwrapped() {
    let app = app();
    let (status, body) = send(&app, "GET", "/healthz", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn unknown_provider_is_a_wrapped_404() {
    let app = app();
    let (status, body) = send(&app, "POST", "/connections/gitlab/start", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().contains("gitlab"));
    assert!(!body["traceId"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn start_returns_auth_url_and_state() {
    let app = app();
    let (status, body) = send(&app, "POST", "/connections/github/start", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert!(data["authUrl"].as_str().unwrap().contains("github.com"));
    assert!(!data["state"].as_str().unwrap().is_empty());
    assert_eq!(data["provider"], "github");
}

#[tokio::test]
async fn demo_connect_returns_connection_without_credentials() {
    let app = app();
    let (status, body) = send(&app, "POST", "/connections/github/connect", None).await;
    assert_eq!(status, StatusCode::CREATED);

    let connection = &body["data"]["connection"];
    assert_eq!(connection["provider"], "github");
    assert_eq!(connection["status"], "ACTIVE");
    assert_eq!(connection["authLevel"], "WRITE_HIGH");
    // Credential material never leaves the core.
    assert!(connection.get("accessToken").is_none());

    let capabilities = &body["data"]["capabilities"];
    assert_eq!(capabilities["demoMode"], true);
    assert!(capabilities["actions"].as_array().unwrap().len() >= 9);
}

#[tokio::test]
async fn full_plan_lifecycle_over_http() {
    let app = app();

    let (_, connect) = send(&app, "POST", "/connections/github/connect", None).await;
    let connection_id = connect["data"]["connection"]["id"].as_str().unwrap().to_string();

    // Plan from intent.
    let (status, plan) = send(
        &app,
        "POST",
        "/plans",
        Some(json!({
            "connectionId": connection_id,
            "sessionId": "s-http",
            "intent": "protect the main branch of acme/website"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let plan_id = plan["data"]["id"].as_str().unwrap().to_string();
    assert_eq!(plan["data"]["riskLevel"], "HIGH");
    assert_eq!(plan["data"]["confirmRequired"], true);
    assert_eq!(plan["data"]["status"], "draft");

    // Dry-run: previews, no side effects recorded as real.
    let (status, preview) = send(&app, "POST", &format!("/plans/{plan_id}/dry-run"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(preview["data"]["success"], true);
    assert_eq!(preview["data"]["dryRun"], true);
    let steps = preview["data"]["stepResults"].as_array().unwrap();
    assert!(steps.iter().all(|s| s["executionMode"] == "PLAN_ONLY"));

    // Approve and execute.
    let (status, run) = send(&app, "POST", &format!("/plans/{plan_id}/approve"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(run["data"]["success"], true);
    let run_id = run["data"]["runId"].as_str().unwrap().to_string();
    let last_step = run["data"]["stepResults"].as_array().unwrap().last().unwrap().clone();
    assert!(last_step["rollbackPlan"].is_object());
    assert_eq!(last_step["evidence"]["demoMode"], true);

    // The plan is now executed; a second approval is rejected.
    let (status, rejected) = send(&app, "POST", &format!("/plans/{plan_id}/approve"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected["success"], false);

    // Roll back.
    let (status, rollback) = send(
        &app,
        "POST",
        &format!("/runs/{run_id}/rollback"),
        Some(json!({ "actorId": "operator-2" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rollback["data"]["success"], true);
    assert_eq!(rollback["data"]["partial"], true);

    // The run shows its terminal rollback state.
    let (_, run) = send(&app, "GET", &format!("/runs/{run_id}"), None).await;
    assert_eq!(run["data"]["status"], "rolled_back");

    // Audit trail covers the whole flow.
    let (_, audit) = send(&app, "GET", "/audit?tenantId=demo-tenant", None).await;
    let events: Vec<String> = audit["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["event_type"].as_str().unwrap().to_string())
        .collect();
    for expected in [
        "connection_created",
        "capabilities_discovered",
        "plan_created",
        "plan_approved",
        "run_executed",
        "rollback_executed",
    ] {
        assert!(events.iter().any(|e| e == expected), "missing {expected}");
    }
}

#[tokio::test]
async fn unmatched_intent_is_a_wrapped_400() {
    let app = app();
    let (_, connect) = send(&app, "POST", "/connections/github/connect", None).await;
    let connection_id = connect["data"]["connection"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        "POST",
        "/plans",
        Some(json!({ "connectionId": connection_id, "intent": "sing me a song" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn disconnect_blocks_further_execution() {
    let app = app();
    let (_, connect) = send(&app, "POST", "/connections/github/connect", None).await;
    let connection_id = connect["data"]["connection"]["id"].as_str().unwrap().to_string();

    let (_, plan) = send(
        &app,
        "POST",
        "/plans",
        Some(json!({ "connectionId": connection_id, "intent": "list issues in acme/website" })),
    )
    .await;
    let plan_id = plan["data"]["id"].as_str().unwrap().to_string();

    let (status, revoked) = send(
        &app,
        "POST",
        "/connections/github/disconnect",
        Some(json!({ "connectionId": connection_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revoked["data"]["status"], "REVOKED");

    let (status, body) = send(&app, "POST", &format!("/plans/{plan_id}/dry-run"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("not active"));
}
