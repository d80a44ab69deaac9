//! Test doubles for the device directory and the telemetry sink

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::directory::{DeviceDirectory, DirectoryError, DirectoryResult};
use crate::notifier::{SinkError, TelemetryEvent, TelemetrySink};
use crate::types::DeviceDescriptor;

/// Directory that serves a fixed lamp list and counts calls
#[derive(Default)]
pub struct StubDirectory {
    lamps: Mutex<Vec<DeviceDescriptor>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl StubDirectory {
    pub fn with_lamps(ids: &[&str]) -> Self {
        let directory = Self::default();
        directory.set_lamps(ids);
        directory
    }

    pub fn failing() -> Self {
        let directory = Self::default();
        directory.set_failing(true);
        directory
    }

    pub fn set_lamps(&self, ids: &[&str]) {
        *self.lamps.lock() = ids.iter().map(|id| DeviceDescriptor::new(*id)).collect();
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DeviceDirectory for StubDirectory {
    async fn list_devices(&self, device_type: &str) -> DirectoryResult<Vec<DeviceDescriptor>> {
        assert_eq!(device_type, "light");
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(DirectoryError::Network("connection refused".to_string()));
        }
        Ok(self.lamps.lock().clone())
    }
}

/// Sink that records every submitted event, or rejects them all
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<TelemetryEvent>>,
    failing: AtomicBool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.failing.store(true, Ordering::SeqCst);
        sink
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl TelemetrySink for RecordingSink {
    async fn submit(&self, event: &TelemetryEvent) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Status(503));
        }
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Serve `router` on an ephemeral local port and return its base URL
pub async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}
