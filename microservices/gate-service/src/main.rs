//! Gate Service
//!
//! Accepts gate open/close commands and keeps an access log of who issued
//! them. Actuation itself is out of scope; this service records intent.

use anyhow::Context;
use axum::Router;
use hearth_core::{DependencyStatus, HearthService, MicroserviceRuntime, ReadinessStatus, Result, ServiceConfig};
use hearth_db::{DbPool, PoolConfig, StorageBackend};
use std::sync::Arc;
use tracing::info;

mod api;
mod repository;
mod types;

#[cfg(test)]
mod tests;

use crate::repository::{GateLogRepository, InMemoryGateLogRepository, PgGateLogRepository};

const SERVICE_NAME: &str = "gate-service";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = hearth_telemetry::init(SERVICE_NAME) {
        eprintln!("{}", e);
    }

    let server = Arc::new(GateServer::new().context("building gate service")?);
    MicroserviceRuntime::run(server).await.context("running gate service")?;
    Ok(())
}

pub struct GateServer {
    config: ServiceConfig,
    repository: Arc<dyn GateLogRepository>,
}

impl GateServer {
    pub fn new() -> Result<Self> {
        let config = ServiceConfig::from_env(SERVICE_NAME, 4000)?;

        let repository: Arc<dyn GateLogRepository> = match StorageBackend::from_env("GATE_STORAGE")? {
            StorageBackend::Postgres => Arc::new(PgGateLogRepository::new(DbPool::new(PoolConfig::from_env())?)),
            StorageBackend::Memory => Arc::new(InMemoryGateLogRepository::new()),
        };

        Ok(Self::with_repository(config, repository))
    }

    pub fn with_repository(config: ServiceConfig, repository: Arc<dyn GateLogRepository>) -> Self {
        Self { config, repository }
    }

    pub fn router(&self, probes: Router) -> Router {
        api::rest::create_router(self.config.service_name.clone(), self.repository.clone()).merge(probes)
    }
}

#[async_trait::async_trait]
impl HearthService for GateServer {
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
        info!("Shutting down Gate Service");
        Ok(())
    }

    async fn start(&self, probes: Router) -> Result<()> {
        info!(http = %self.config.http_bind, "Starting Gate Service server");

        let listener = tokio::net::TcpListener::bind(&self.config.http_bind).await?;
        axum::serve(listener, self.router(probes)).await?;

        Ok(())
    }
}
