//! HTTP-level tests for Telemetry Service

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use hearth_core::{probe_router, ServiceConfig};

use crate::repository::InMemoryTelemetryRepository;
use crate::TelemetryServer;

fn router() -> (Router, Arc<InMemoryTelemetryRepository>) {
    let repository = Arc::new(InMemoryTelemetryRepository::new());
    let config = ServiceConfig {
        service_name: "telemetry-service".to_string(),
        http_bind: "127.0.0.1:0".to_string(),
        log_level: "info".to_string(),
    };
    let server = Arc::new(TelemetryServer::with_repository(config, repository.clone()));
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

fn submit(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/telemetry")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_submit_lamp_notification() {
    let (router, repository) = router();

    let (status, body) = send(
        &router,
        submit(json!({ "device_id": "l1", "metric_type": "lamp_state", "value": 1, "unit": "state" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["message"], "Telemetry data saved successfully");
    assert_eq!(body["data"]["telemetry"]["device_id"], "l1");
    assert_eq!(body["data"]["telemetry"]["value"], 1.0);
    assert_eq!(body["data"]["telemetry"]["unit"], "state");
    assert!(body["data"]["telemetry"]["created_at"].is_string());
    assert_eq!(repository.len(), 1);
}

#[tokio::test]
async fn test_submit_numeric_device_id() {
    let (router, _) = router();

    let (status, body) = send(
        &router,
        submit(json!({ "device_id": 42, "metric_type": "temperature", "value": 21.5, "unit": "celsius" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["telemetry"]["device_id"], "42");

    let (_, body) = send(&router, get("/telemetry?device_id=42")).await;
    assert_eq!(body["data"]["telemetry"][0]["value"], 21.5);
}

#[tokio::test]
async fn test_submit_missing_fields_is_400() {
    let (router, repository) = router();

    for payload in [
        json!({ "metric_type": "brightness", "value": 5 }),
        json!({ "device_id": "l1", "value": 5 }),
        json!({ "device_id": "l1", "metric_type": "brightness" }),
        json!({ "device_id": "l1", "metric_type": "brightness", "value": "high" }),
    ] {
        let (status, body) = send(&router, submit(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "success": false, "error": "Missing required fields: device_id, metric_type, value" })
        );
    }
    assert_eq!(repository.len(), 0);
}

#[tokio::test]
async fn test_list_filters_newest_first() {
    let (router, _) = router();
    for (device, metric, value) in [
        ("l1", "brightness", 10),
        ("l2", "brightness", 20),
        ("l1", "lamp_state", 1),
        ("l1", "brightness", 30),
    ] {
        send(&router, submit(json!({ "device_id": device, "metric_type": metric, "value": value }))).await;
    }

    let (status, body) = send(&router, get("/telemetry?device_id=l1&metric_type=brightness")).await;
    assert_eq!(status, StatusCode::OK);
    let values: Vec<f64> = body["data"]["telemetry"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["value"].as_f64().unwrap())
        .collect();
    assert_eq!(values, vec![30.0, 10.0]);

    let (_, body) = send(&router, get("/telemetry?limit=2")).await;
    assert_eq!(body["data"]["telemetry"].as_array().unwrap().len(), 2);

    let (status, _) = send(&router, get("/telemetry?limit=lots")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats() {
    let (router, _) = router();
    for value in [20, 40] {
        send(&router, submit(json!({ "device_id": "l1", "metric_type": "brightness", "value": value }))).await;
    }
    send(&router, submit(json!({ "device_id": "l2", "metric_type": "brightness", "value": 5 }))).await;

    let (status, body) = send(&router, get("/telemetry/stats?device_id=l1")).await;
    assert_eq!(status, StatusCode::OK);
    let stats = body["data"]["stats"].as_array().unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0]["count"], 2);
    assert_eq!(stats[0]["avg_value"], 30.0);
    assert_eq!(stats[0]["min_value"], 20.0);
    assert_eq!(stats[0]["max_value"], 40.0);

    let (_, body) = send(&router, get("/telemetry/stats")).await;
    assert_eq!(body["data"]["stats"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_health() {
    let (router, _) = router();
    let (status, body) = send(&router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "telemetry-service");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_ready_reports_storage() {
    let (router, _) = router();
    let (status, body) = send(&router, get("/ready")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ready"], true);
    assert_eq!(body["dependencies"][0]["name"], "postgres");
}
