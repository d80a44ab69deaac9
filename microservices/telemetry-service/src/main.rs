//! Telemetry Service
//!
//! Records metric readings submitted by devices and other services
//! (the lamp service forwards every state change here), and answers
//! filtered queries and per-device aggregates.

use anyhow::Context;
use axum::Router;
use hearth_core::{DependencyStatus, HearthService, MicroserviceRuntime, ReadinessStatus, Result, ServiceConfig};
use hearth_db::{DbPool, PoolConfig, StorageBackend};
use std::sync::Arc;
use tracing::{info, warn};

mod api;
mod repository;
mod types;

#[cfg(test)]
mod tests;

use crate::repository::{InMemoryTelemetryRepository, PgTelemetryRepository, TelemetryRepository};

const SERVICE_NAME: &str = "telemetry-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = hearth_telemetry::init(SERVICE_NAME) {
        eprintln!("{}", e);
    }

    let server = Arc::new(TelemetryServer::new().context("building telemetry service")?);
    MicroserviceRuntime::run(server).await.context("running telemetry service")?;
    Ok(())
}

pub struct TelemetryServer {
    config: ServiceConfig,
    repository: Arc<dyn TelemetryRepository>,
}

impl TelemetryServer {
    pub fn new() -> Result<Self> {
        let config = ServiceConfig::from_env(SERVICE_NAME, 8084)?;

        let backend = StorageBackend::from_env("TELEMETRY_STORAGE")?;
        let repository: Arc<dyn TelemetryRepository> = match backend {
            StorageBackend::Postgres => Arc::new(PgTelemetryRepository::new(DbPool::new(PoolConfig::from_env())?)),
            StorageBackend::Memory => {
                warn!("Telemetry is kept in memory and will be lost on restart");
                Arc::new(InMemoryTelemetryRepository::new())
            }
        };

        Ok(Self::with_repository(config, repository))
    }

    pub fn with_repository(config: ServiceConfig, repository: Arc<dyn TelemetryRepository>) -> Self {
        Self { config, repository }
    }

    pub fn router(&self, probes: Router) -> Router {
        api::rest::create_router(self.config.service_name.clone(), self.repository.clone()).merge(probes)
    }
}

#[async_trait::async_trait]
impl HearthService for TelemetryServer {
    fn service_id(&self) -> &'static str {
        SERVICE_NAME
    }

    async fn ready(&self) -> ReadinessStatus {
        let available = self.repository.is_healthy().await;
        ReadinessStatus {
            ready: available,
            dependencies: vec![DependencyStatus {
                name: "postgres".to_string(),
                available,
                latency_ms: None,
            }],
        }
    }

    async fn shutdown(&self) -> Result<()> {
        info!("Shutting down Telemetry Service");
        Ok(())
    }

    async fn start(&self, probes: Router) -> Result<()> {
        let connected = self.repository.is_healthy().await;
        info!(http = %self.config.http_bind, database_connected = connected, "Starting Telemetry Service server");

        let listener = tokio::net::TcpListener::bind(&self.config.http_bind).await?;
        axum::serve(listener, self.router(probes)).await?;

        Ok(())
    }
}
