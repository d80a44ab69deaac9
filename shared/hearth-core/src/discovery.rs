//! Service Discovery
//!
//! Resolves peer service base URLs from environment variables, falling back
//! to the well-known compose hostnames.

use std::collections::HashMap;
use std::env;
use tracing::debug;

/// Environment based service discovery
#[derive(Debug, Clone, Default)]
pub struct ServiceDiscovery {
    overrides: HashMap<String, String>,
}

impl ServiceDiscovery {
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Pin a service to a fixed URL, ignoring the environment.
    pub fn with_override(mut self, service_name: &str, url: impl Into<String>) -> Self {
        self.overrides.insert(service_name.to_string(), url.into());
        self
    }

    /// Get service base URL by name, without a trailing slash
    pub fn service_url(&self, service_name: &str) -> Option<String> {
        let url = self
            .overrides
            .get(service_name)
            .cloned()
            .or_else(|| env::var(Self::env_key(service_name)).ok())
            .or_else(|| Self::well_known(service_name).map(str::to_string))?;

        debug!(service = service_name, url = %url, "Resolved service endpoint");
        Some(url.trim_end_matches('/').to_string())
    }

    /// device-service -> DEVICE_SERVICE_URL
    pub fn env_key(service_name: &str) -> String {
        format!("{}_URL", service_name.to_uppercase().replace('-', "_"))
    }

    fn well_known(service_name: &str) -> Option<&'static str> {
        match service_name {
            "device-service" => Some("http://device-service:8082"),
            "lamp-service" => Some("http://lamp-service:8083"),
            "telemetry-service" => Some("http://telemetry-service:8084"),
            "gate-service" => Some("http://gate-service:4000"),
            _ => None,
        }
    }
}
