//! HTTP-level tests for Gate Service

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use hearth_core::{probe_router, ServiceConfig};

use crate::repository::InMemoryGateLogRepository;
use crate::GateServer;

fn router() -> (Router, Arc<InMemoryGateLogRepository>) {
    let repository = Arc::new(InMemoryGateLogRepository::new());
    let config = ServiceConfig {
        service_name: "gate-service".to_string(),
        http_bind: "127.0.0.1:0".to_string(),
        log_level: "info".to_string(),
    };
    let server = Arc::new(GateServer::with_repository(config, repository.clone()));
    (server.router(probe_router(server.clone())), repository)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn command(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/gate")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn logs() -> Request<Body> {
    Request::builder().uri("/gate/logs").body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_open_is_accepted_and_logged() {
    let (router, repository) = router();

    let (status, body) = send(&router, command(json!({ "action": "open", "user_id": "alice" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "Gate open command accepted." }));
    assert_eq!(repository.len(), 1);

    let (status, body) = send(&router, logs()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["action"], "open");
    assert_eq!(body[0]["user_id"], "alice");
}

#[tokio::test]
async fn test_invalid_action_is_rejected_and_not_logged() {
    let (router, repository) = router();

    for body in [json!({ "action": "lock" }), json!({ "user_id": 3 }), json!({ "action": 1 })] {
        let (status, body) = send(&router, command(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }
    let (_, body) = send(&router, command(json!({ "action": "lock" }))).await;
    assert_eq!(body["error"], "Invalid action. Use 'open' or 'close'.");
    assert_eq!(repository.len(), 0);
}

#[tokio::test]
async fn test_logs_capped_and_newest_first() {
    let (router, _) = router();

    for i in 0..25 {
        let action = if i % 2 == 0 { "open" } else { "close" };
        send(&router, command(json!({ "action": action, "user_id": i }))).await;
    }

    let (_, body) = send(&router, logs()).await;
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 20);
    assert_eq!(entries[0]["user_id"], "24");
    assert_eq!(entries[0]["action"], "open");
    assert_eq!(entries[19]["user_id"], "5");
}

#[tokio::test]
async fn test_health_reports_database() {
    let (router, _) = router();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&router, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "gate-service");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_ready_reports_storage() {
    let (router, _) = router();
    let request = Request::builder().uri("/ready").body(Body::empty()).unwrap();
    let (status, body) = send(&router, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["dependencies"][0]["name"], "postgres");
    assert_eq!(body["dependencies"][0]["available"], true);
}
