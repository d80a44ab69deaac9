//! JSON response envelope shared by every service

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// `{success, data?, error?}`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub service: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,
}

impl HealthReport {
    pub fn healthy(service: impl Into<String>) -> Self {
        Self {
            status: "healthy",
            service: service.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            database: None,
        }
    }

    pub fn with_database(mut self, connected: bool) -> Self {
        self.database = Some(if connected { "connected" } else { "disconnected" });
        self
    }
}
