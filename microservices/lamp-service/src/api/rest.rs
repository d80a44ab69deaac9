//! Lamp Service REST API

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use hearth_core::{ApiResponse, HealthReport, HearthError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::control::LampService;
use crate::types::{LampEntry, Power};

#[derive(Clone)]
pub struct AppState {
    pub service_name: String,
    pub lamps: LampService,
}

pub fn create_router(service_name: impl Into<String>, lamps: LampService) -> Router {
    let state = AppState {
        service_name: service_name.into(),
        lamps,
    };

    Router::new()
        // Health
        .route("/health", get(health))
        // Lamps
        .route("/lamps", get(list_lamps))
        .route("/lamps/{id}/toggle", post(toggle_lamp))
        .route("/lamps/{id}/brightness", post(set_brightness))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport::healthy(state.service_name))
}

// Listing

#[derive(Serialize)]
struct LampsData {
    lamps: Vec<LampEntry>,
}

#[derive(Serialize)]
struct LampsResponse {
    success: bool,
    data: LampsData,
    cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn list_lamps(State(state): State<AppState>) -> Result<Json<LampsResponse>, HearthError> {
    match state.lamps.list_lamps().await {
        Ok(listing) => Ok(Json(LampsResponse {
            success: true,
            data: LampsData { lamps: listing.lamps },
            cached: listing.cached,
            error: listing.notice,
        })),
        Err(e) => {
            warn!(error = %e, "Lamp listing failed");
            Err(HearthError::UpstreamUnavailable("Failed to fetch lamps".to_string()))
        }
    }
}

// Control

#[derive(Serialize)]
struct ToggleData {
    lamp_id: String,
    power: Power,
    message: String,
}

async fn toggle_lamp(
    State(state): State<AppState>,
    Path(lamp_id): Path<String>,
) -> Json<ApiResponse<ToggleData>> {
    let power = state.lamps.toggle_power(&lamp_id);
    Json(ApiResponse::ok(ToggleData {
        lamp_id,
        power,
        message: format!("Lamp turned {}", power),
    }))
}

#[derive(Deserialize)]
struct BrightnessRequest {
    brightness: Option<i64>,
}

#[derive(Serialize)]
struct BrightnessData {
    lamp_id: String,
    brightness: u8,
    power: Power,
}

async fn set_brightness(
    State(state): State<AppState>,
    Path(lamp_id): Path<String>,
    body: Result<Json<BrightnessRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<BrightnessData>>, HearthError> {
    let brightness = body
        .ok()
        .and_then(|Json(req)| req.brightness)
        .ok_or_else(|| HearthError::Validation("Brightness must be between 0 and 100".to_string()))?;

    let lamp = state.lamps.set_brightness(&lamp_id, brightness)?;
    Ok(Json(ApiResponse::ok(BrightnessData {
        lamp_id,
        brightness: lamp.brightness,
        power: lamp.power,
    })))
}
