//! Lamp service wiring and lifecycle

use axum::Router;
use hearth_core::{DependencyStatus, HearthError, HearthService, ReadinessStatus, Result};
use std::sync::Arc;
use tracing::info;

use crate::api;
use crate::cache::LampCache;
use crate::config::{LampServiceConfig, SERVICE_NAME};
use crate::control::LampService;
use crate::directory::HttpDeviceDirectory;
use crate::notifier::{HttpTelemetrySink, TelemetryNotifier};
use crate::store::LampStateStore;

pub struct LampServer {
    config: LampServiceConfig,
    lamps: LampService,
}

impl LampServer {
    /// Build the HTTP-backed directory and sink and start the telemetry
    /// dispatcher. Must be called inside a tokio runtime.
    pub fn new(config: LampServiceConfig) -> Result<Self> {
        let directory = HttpDeviceDirectory::new(&config.device_service_url, config.http_timeout)
            .map_err(|e| HearthError::Config(e.to_string()))?;
        let sink = HttpTelemetrySink::new(&config.telemetry_service_url, config.http_timeout)
            .map_err(|e| HearthError::Config(e.to_string()))?;

        let store = LampStateStore::new();
        let cache = Arc::new(LampCache::new(Arc::new(directory), store.clone(), config.cache));
        let (notifier, _dispatcher) = TelemetryNotifier::spawn(Arc::new(sink), config.telemetry_queue_capacity);

        info!(
            device_service = %config.device_service_url,
            telemetry_service = %config.telemetry_service_url,
            cache_ttl_secs = config.cache.ttl.as_secs(),
            max_staleness_secs = ?config.cache.max_staleness.map(|d| d.as_secs()),
            "Lamp service configured"
        );

        Ok(Self::with_lamps(config, LampService::new(store, cache, notifier)))
    }

    pub fn with_lamps(config: LampServiceConfig, lamps: LampService) -> Self {
        Self { config, lamps }
    }

    /// Service routes merged with the runtime's probe routes
    pub fn router(&self, probes: Router) -> Router {
        api::rest::create_router(self.config.service.service_name.clone(), self.lamps.clone()).merge(probes)
    }
}

#[async_trait::async_trait]
impl HearthService for LampServer {
    fn service_id(&self) -> &'static str {
        SERVICE_NAME
    }

    /// Always ready: stale snapshots keep listings working while the device
    /// service is down, so its availability is reported but not required.
    async fn ready(&self) -> ReadinessStatus {
        ReadinessStatus {
            ready: true,
            dependencies: vec![DependencyStatus {
                name: "device-service".to_string(),
                available: self.lamps.cache().upstream_healthy(),
                latency_ms: None,
            }],
        }
    }

    async fn shutdown(&self) -> Result<()> {
        let cache = self.lamps.cache().metrics();
        let telemetry = self.lamps.notifier().stats();
        info!(
            cache_hits = cache.hits.get(),
            cache_refreshes = cache.refreshes.get(),
            cache_fallbacks = cache.fallbacks.get(),
            upstream_failures = cache.upstream_failures.get(),
            telemetry_delivered = telemetry.delivered.get(),
            telemetry_dead_letters = telemetry.dead_letters.get(),
            telemetry_queued = telemetry.queued.get(),
            "Shutting down Lamp Service"
        );
        Ok(())
    }

    async fn start(&self, probes: Router) -> Result<()> {
        info!(http = %self.config.service.http_bind, "Starting Lamp Service server");

        let listener = tokio::net::TcpListener::bind(&self.config.service.http_bind).await?;
        axum::serve(listener, self.router(probes)).await?;

        Ok(())
    }
}
