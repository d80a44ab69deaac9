//! Fire-and-forget telemetry forwarding
//!
//! Handlers enqueue events without waiting; a background dispatcher posts
//! them to the telemetry service. Anything that cannot be delivered, whether
//! the queue is full or the sink refuses it, ends up in the dead-letter log
//! and counter instead of surfacing to the caller.

use async_trait::async_trait;
use hearth_telemetry::{Counter, Gauge};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::types::Power;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryEvent {
    pub device_id: String,
    pub metric_type: String,
    pub value: f64,
    pub unit: Option<String>,
}

impl TelemetryEvent {
    pub fn lamp_state(lamp_id: &str, power: Power) -> Self {
        Self {
            device_id: lamp_id.to_string(),
            metric_type: "lamp_state".to_string(),
            value: power.metric_value(),
            unit: Some("state".to_string()),
        }
    }

    pub fn brightness(lamp_id: &str, brightness: u8) -> Self {
        Self {
            device_id: lamp_id.to_string(),
            metric_type: "brightness".to_string(),
            value: f64::from(brightness),
            unit: Some("percent".to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Telemetry service returned status {0}")]
    Status(u16),
}

#[async_trait]
pub trait TelemetrySink: Send + Sync {
    async fn submit(&self, event: &TelemetryEvent) -> Result<(), SinkError>;
}

/// `POST {base_url}/telemetry`
pub struct HttpTelemetrySink {
    endpoint: String,
    http_client: reqwest::Client,
}

impl HttpTelemetrySink {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SinkError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SinkError::Network(e.to_string()))?;

        Ok(Self {
            endpoint: format!("{}/telemetry", base_url),
            http_client,
        })
    }
}

#[async_trait]
impl TelemetrySink for HttpTelemetrySink {
    async fn submit(&self, event: &TelemetryEvent) -> Result<(), SinkError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .json(event)
            .send()
            .await
            .map_err(|e| SinkError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SinkError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct NotifierStats {
    pub delivered: Counter,
    pub dead_letters: Counter,
    pub queued: Gauge,
}

impl Default for NotifierStats {
    fn default() -> Self {
        Self {
            delivered: Counter::new("telemetry_delivered"),
            dead_letters: Counter::new("telemetry_dead_letters"),
            queued: Gauge::new("telemetry_queued"),
        }
    }
}

#[derive(Clone)]
pub struct TelemetryNotifier {
    tx: mpsc::Sender<TelemetryEvent>,
    stats: NotifierStats,
}

impl TelemetryNotifier {
    /// Start the dispatcher task. It exits once every notifier clone is dropped
    /// and the queue has drained.
    pub fn spawn(sink: Arc<dyn TelemetrySink>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let stats = NotifierStats::default();
        let handle = tokio::spawn(dispatch_loop(sink, rx, stats.clone()));
        (Self { tx, stats }, handle)
    }

    /// Enqueue without waiting. Never fails the caller.
    pub fn notify(&self, event: TelemetryEvent) {
        // Counted before sending so the dispatcher never decrements first
        self.stats.queued.inc();
        let rejected = match self.tx.try_send(event) {
            Ok(()) => return,
            Err(TrySendError::Full(event)) => (event, "queue full"),
            Err(TrySendError::Closed(event)) => (event, "dispatcher stopped"),
        };
        self.stats.queued.dec();
        dead_letter(&self.stats, &rejected.0, rejected.1);
    }

    pub fn stats(&self) -> &NotifierStats {
        &self.stats
    }
}

async fn dispatch_loop(
    sink: Arc<dyn TelemetrySink>,
    mut rx: mpsc::Receiver<TelemetryEvent>,
    stats: NotifierStats,
) {
    while let Some(event) = rx.recv().await {
        stats.queued.dec();
        match sink.submit(&event).await {
            Ok(()) => {
                stats.delivered.inc();
                debug!(device_id = %event.device_id, metric_type = %event.metric_type, "Telemetry delivered");
            }
            Err(e) => dead_letter(&stats, &event, &e.to_string()),
        }
    }
    debug!("Telemetry dispatcher stopped");
}

fn dead_letter(stats: &NotifierStats, event: &TelemetryEvent, reason: &str) {
    stats.dead_letters.inc();
    warn!(
        target: "telemetry_dead_letter",
        device_id = %event.device_id,
        metric_type = %event.metric_type,
        value = event.value,
        reason,
        "Telemetry notification dropped"
    );
}
