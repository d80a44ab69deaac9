//! Lamp Service configuration

use hearth_core::config::{env_parse, env_parse_opt};
use hearth_core::{HearthError, Result, ServiceConfig, ServiceDiscovery};
use std::time::Duration;

use crate::cache::CachePolicy;

pub const SERVICE_NAME: &str = "lamp-service";

#[derive(Debug, Clone)]
pub struct LampServiceConfig {
    pub service: ServiceConfig,
    pub device_service_url: String,
    pub telemetry_service_url: String,
    pub cache: CachePolicy,
    pub telemetry_queue_capacity: usize,
    pub http_timeout: Duration,
}

impl LampServiceConfig {
    pub fn from_env() -> Result<Self> {
        let discovery = ServiceDiscovery::from_env();
        Self::from_env_with(&discovery)
    }

    pub fn from_env_with(discovery: &ServiceDiscovery) -> Result<Self> {
        let resolve = |name: &str| {
            discovery.service_url(name).ok_or_else(|| {
                HearthError::Config(format!("{} is not set", ServiceDiscovery::env_key(name)))
            })
        };

        Ok(Self {
            service: ServiceConfig::from_env(SERVICE_NAME, 8083)?,
            device_service_url: resolve("device-service")?,
            telemetry_service_url: resolve("telemetry-service")?,
            cache: CachePolicy {
                ttl: Duration::from_secs(env_parse("LAMP_CACHE_TTL_SECS", 30)?),
                max_staleness: env_parse_opt::<u64>("LAMP_CACHE_MAX_STALENESS_SECS")?
                    .map(Duration::from_secs),
            },
            telemetry_queue_capacity: env_parse("TELEMETRY_QUEUE_CAPACITY", 1024)?,
            http_timeout: Duration::from_secs(env_parse("HTTP_CLIENT_TIMEOUT_SECS", 5)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_resolve_peer_urls() {
        let discovery = ServiceDiscovery::from_env()
            .with_override("device-service", "http://127.0.0.1:18082")
            .with_override("telemetry-service", "http://127.0.0.1:18084/");
        let config = LampServiceConfig::from_env_with(&discovery).unwrap();

        assert_eq!(config.device_service_url, "http://127.0.0.1:18082");
        assert_eq!(config.telemetry_service_url, "http://127.0.0.1:18084");
        assert!(config.telemetry_queue_capacity > 0);
    }
}
