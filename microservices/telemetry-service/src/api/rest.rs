//! Telemetry Service REST API

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    routing::get,
    Json, Router,
};
use hearth_core::{ApiResponse, HealthReport, HearthError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::repository::TelemetryRepository;
use crate::types::{MetricStats, NewTelemetry, TelemetryFilter, TelemetryRecord, DEFAULT_LIMIT, MAX_LIMIT};

const MISSING_FIELDS: &str = "Missing required fields: device_id, metric_type, value";

#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub repository: Arc<dyn TelemetryRepository>,
}

pub fn create_router(service_name: impl Into<String>, repository: Arc<dyn TelemetryRepository>) -> Router {
    let state = AppState {
        service_name: service_name.into(),
        repository,
    };

    Router::new()
        .route("/health", get(health))
        .route("/telemetry", get(list_telemetry).post(submit_telemetry))
        .route("/telemetry/stats", get(telemetry_stats))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let connected = state.repository.is_healthy().await;
    Json(HealthReport::healthy(state.service_name).with_database(connected))
}

// Queries

#[derive(Debug, Deserialize)]
struct ListParams {
    device_id: Option<String>,
    metric_type: Option<String>,
    limit: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ListParams {
    fn into_filter(self) -> Result<TelemetryFilter, HearthError> {
        let limit = match non_empty(self.limit) {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .map_err(|_| HearthError::Validation(format!("Invalid limit: {}", raw)))?,
            None => DEFAULT_LIMIT,
        };

        Ok(TelemetryFilter {
            device_id: non_empty(self.device_id),
            metric_type: non_empty(self.metric_type),
            limit: limit.clamp(1, MAX_LIMIT),
        })
    }
}

#[derive(Serialize)]
struct TelemetryList {
    telemetry: Vec<TelemetryRecord>,
}

async fn list_telemetry(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<TelemetryList>>, HearthError> {
    let filter = params.into_filter()?;
    let telemetry = state.repository.list(&filter).await?;
    Ok(Json(ApiResponse::ok(TelemetryList { telemetry })))
}

#[derive(Debug, Deserialize)]
struct StatsParams {
    device_id: Option<String>,
}

#[derive(Serialize)]
struct StatsList {
    stats: Vec<MetricStats>,
}

async fn telemetry_stats(
    State(state): State<AppState>,
    Query(params): Query<StatsParams>,
) -> Result<Json<ApiResponse<StatsList>>, HearthError> {
    let device_id = non_empty(params.device_id);
    let stats = state.repository.stats(device_id.as_deref()).await?;
    Ok(Json(ApiResponse::ok(StatsList { stats })))
}

// Ingestion

/// Devices may identify themselves with a string or a number
fn device_id_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_empty(Some(s)),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct SubmitRequest {
    device_id: Option<Value>,
    metric_type: Option<String>,
    value: Option<f64>,
    unit: Option<String>,
}

impl SubmitRequest {
    fn validate(self) -> Result<NewTelemetry, HearthError> {
        let missing = || HearthError::Validation(MISSING_FIELDS.to_string());
        Ok(NewTelemetry {
            device_id: device_id_text(self.device_id).ok_or_else(missing)?,
            metric_type: non_empty(self.metric_type).ok_or_else(missing)?,
            value: self.value.ok_or_else(missing)?,
            unit: non_empty(self.unit),
        })
    }
}

#[derive(Serialize)]
struct SubmitResult {
    telemetry: TelemetryRecord,
    message: &'static str,
}

async fn submit_telemetry(
    State(state): State<AppState>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SubmitResult>>, HearthError> {
    let record = body
        .map_err(|_| HearthError::Validation(MISSING_FIELDS.to_string()))?
        .0
        .validate()?;

    let telemetry = state.repository.insert(record).await?;
    debug!(id = telemetry.id, device_id = %telemetry.device_id, "Telemetry stored");

    Ok(Json(ApiResponse::ok(SubmitResult {
        telemetry,
        message: "Telemetry data saved successfully",
    })))
}
