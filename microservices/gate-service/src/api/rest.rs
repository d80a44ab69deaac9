//! Gate Service REST API

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use hearth_core::{HealthReport, HearthError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::repository::GateLogRepository;
use crate::types::{GateAction, GateLogEntry};

/// Number of entries returned by `GET /gate/logs`
pub const RECENT_LOG_LIMIT: i64 = 20;

#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub repository: Arc<dyn GateLogRepository>,
}

pub fn create_router(service_name: impl Into<String>, repository: Arc<dyn GateLogRepository>) -> Router {
    let state = AppState {
        service_name: service_name.into(),
        repository,
    };

    Router::new()
        .route("/health", get(health))
        .route("/gate", post(command_gate))
        .route("/gate/logs", get(recent_logs))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    let connected = state.repository.is_healthy().await;
    Json(HealthReport::healthy(state.service_name).with_database(connected))
}

#[derive(Deserialize)]
struct GateRequest {
    action: Option<String>,
    /// Clients send either a string or a numeric id
    user_id: Option<Value>,
}

#[derive(Serialize)]
struct GateResponse {
    status: String,
}

fn user_id_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

async fn command_gate(
    State(state): State<AppState>,
    body: Result<Json<GateRequest>, JsonRejection>,
) -> Result<Json<GateResponse>, HearthError> {
    let Json(req) = body.map_err(|e| HearthError::Validation(e.body_text()))?;

    let action: GateAction = req
        .action
        .as_deref()
        .and_then(|a| a.parse().ok())
        .ok_or_else(|| HearthError::Validation("Invalid action. Use 'open' or 'close'.".to_string()))?;
    let user_id = user_id_text(req.user_id);

    state.repository.record(action, user_id.as_deref()).await?;

    // Relay/GPIO actuation is handled outside this service
    info!(
        action = %action,
        user_id = user_id.as_deref().unwrap_or("anonymous"),
        "Gate command received"
    );

    Ok(Json(GateResponse {
        status: format!("Gate {} command accepted.", action),
    }))
}

async fn recent_logs(State(state): State<AppState>) -> Result<Json<Vec<GateLogEntry>>, HearthError> {
    Ok(Json(state.repository.recent(RECENT_LOG_LIMIT).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_text() {
        assert_eq!(user_id_text(None), None);
        assert_eq!(user_id_text(Some(Value::Null)), None);
        assert_eq!(user_id_text(Some(Value::from("bob"))), Some("bob".to_string()));
        assert_eq!(user_id_text(Some(Value::from(17))), Some("17".to_string()));
    }
}
