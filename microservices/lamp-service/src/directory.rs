//! Upstream device directory client

use async_trait::async_trait;
use hearth_telemetry::Counter;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::types::DeviceDescriptor;

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Device service returned status {0}")]
    Status(u16),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Source of truth for which lamps exist
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    async fn list_devices(&self, device_type: &str) -> DirectoryResult<Vec<DeviceDescriptor>>;
}

/// `{data: {devices: [...]}}`; absent levels mean no devices. Entries are
/// kept raw so one bad descriptor cannot sink the whole listing.
#[derive(Debug, Default, Deserialize)]
struct DevicesEnvelope {
    #[serde(default)]
    data: Option<DevicesData>,
}

#[derive(Debug, Default, Deserialize)]
struct DevicesData {
    #[serde(default)]
    devices: Option<Vec<serde_json::Value>>,
}

impl DevicesEnvelope {
    /// Well-formed descriptors in directory order, plus the number skipped
    fn into_devices(self) -> (Vec<DeviceDescriptor>, u64) {
        let mut skipped = 0;
        let devices = self
            .data
            .and_then(|d| d.devices)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<DeviceDescriptor>(raw) {
                Ok(device) => Some(device),
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "Skipping malformed device descriptor");
                    None
                }
            })
            .collect();
        (devices, skipped)
    }
}

/// `GET {base_url}/devices?device_type=...`
pub struct HttpDeviceDirectory {
    base_url: String,
    http_client: reqwest::Client,
    malformed: Counter,
}

impl HttpDeviceDirectory {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> DirectoryResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DirectoryError::Network(e.to_string()))?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
            malformed: Counter::new("lamp_directory_malformed_devices"),
        })
    }

    /// Descriptors dropped because they could not be parsed
    pub fn malformed(&self) -> &Counter {
        &self.malformed
    }
}

#[async_trait]
impl DeviceDirectory for HttpDeviceDirectory {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn list_devices(&self, device_type: &str) -> DirectoryResult<Vec<DeviceDescriptor>> {
        let response = self
            .http_client
            .get(format!("{}/devices", self.base_url))
            .query(&[("device_type", device_type)])
            .send()
            .await
            .map_err(|e| DirectoryError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DirectoryError::Status(status.as_u16()));
        }

        let envelope: DevicesEnvelope = response
            .json()
            .await
            .map_err(|e| DirectoryError::Parse(e.to_string()))?;

        let (devices, skipped) = envelope.into_devices();
        self.malformed.add(skipped);
        debug!(count = devices.len(), skipped, "Fetched devices from directory");
        Ok(devices)
    }
}
