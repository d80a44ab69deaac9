//! Telemetry Service types

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const DEFAULT_LIMIT: i64 = 100;
pub const MAX_LIMIT: i64 = 1000;

/// Stored metric record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub id: i64,
    pub device_id: String,
    pub metric_type: String,
    pub value: f64,
    pub unit: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Validated submission
#[derive(Debug, Clone, PartialEq)]
pub struct NewTelemetry {
    pub device_id: String,
    pub metric_type: String,
    pub value: f64,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryFilter {
    pub device_id: Option<String>,
    pub metric_type: Option<String>,
    pub limit: i64,
}

impl Default for TelemetryFilter {
    fn default() -> Self {
        Self {
            device_id: None,
            metric_type: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl TelemetryFilter {
    pub fn matches(&self, record: &TelemetryRecord) -> bool {
        self.device_id.as_ref().map_or(true, |d| *d == record.device_id)
            && self.metric_type.as_ref().map_or(true, |m| *m == record.metric_type)
    }
}

/// Aggregate per (device, metric type)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStats {
    pub device_id: String,
    pub metric_type: String,
    pub count: i64,
    pub avg_value: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub last_recorded: DateTime<Utc>,
}
