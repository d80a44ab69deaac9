//! Read-through lamp listing cache
//!
//! Serves the last directory snapshot while it is younger than the TTL,
//! refreshes on demand once it expires, and falls back to the stale snapshot
//! whenever a refresh fails. Only the very first listing (no snapshot yet)
//! can fail because of the directory.

use hearth_core::{HearthError, Result};
use hearth_telemetry::Counter;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::directory::DeviceDirectory;
use crate::store::LampStateStore;
use crate::types::LampEntry;

pub const LIGHT_DEVICE_TYPE: &str = "light";
pub const STALE_NOTICE: &str = "Using cached data due to device service error";

/// Cache tuning
#[derive(Debug, Clone, Copy)]
pub struct CachePolicy {
    pub ttl: Duration,
    /// `None` keeps serving stale data for as long as the directory is down
    pub max_staleness: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            max_staleness: None,
        }
    }
}

#[derive(Debug, Clone)]
struct Snapshot {
    lamps: Vec<LampEntry>,
    captured_at: Instant,
}

/// Result of a listing
#[derive(Debug, Clone)]
pub struct LampListing {
    pub lamps: Vec<LampEntry>,
    /// Served from a previous snapshot
    pub cached: bool,
    /// Set when a refresh failed and stale data was served instead
    pub notice: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CacheMetrics {
    pub hits: Counter,
    pub refreshes: Counter,
    pub fallbacks: Counter,
    pub upstream_failures: Counter,
}

impl Default for CacheMetrics {
    fn default() -> Self {
        Self {
            hits: Counter::new("lamp_cache_hits"),
            refreshes: Counter::new("lamp_cache_refreshes"),
            fallbacks: Counter::new("lamp_cache_fallbacks"),
            upstream_failures: Counter::new("lamp_cache_upstream_failures"),
        }
    }
}

pub struct LampCache {
    directory: Arc<dyn DeviceDirectory>,
    store: LampStateStore,
    policy: CachePolicy,
    snapshot: RwLock<Option<Snapshot>>,
    upstream_healthy: AtomicBool,
    metrics: CacheMetrics,
}

impl LampCache {
    pub fn new(directory: Arc<dyn DeviceDirectory>, store: LampStateStore, policy: CachePolicy) -> Self {
        Self {
            directory,
            store,
            policy,
            snapshot: RwLock::new(None),
            upstream_healthy: AtomicBool::new(true),
            metrics: CacheMetrics::default(),
        }
    }

    pub async fn list_lamps(&self) -> Result<LampListing> {
        if let Some(lamps) = self.fresh_snapshot() {
            self.metrics.hits.inc();
            return Ok(LampListing {
                lamps,
                cached: true,
                notice: None,
            });
        }

        match self.directory.list_devices(LIGHT_DEVICE_TYPE).await {
            Ok(devices) => {
                let lamps: Vec<LampEntry> = devices
                    .into_iter()
                    .map(|device| {
                        let state = self.store.get(&device.id);
                        LampEntry { device, state }
                    })
                    .collect();

                *self.snapshot.write() = Some(Snapshot {
                    lamps: lamps.clone(),
                    captured_at: Instant::now(),
                });
                self.upstream_healthy.store(true, Ordering::Relaxed);
                self.metrics.refreshes.inc();
                debug!(count = lamps.len(), "Lamp snapshot refreshed");

                Ok(LampListing {
                    lamps,
                    cached: false,
                    notice: None,
                })
            }
            Err(e) => {
                self.upstream_healthy.store(false, Ordering::Relaxed);
                self.metrics.upstream_failures.inc();

                match self.fallback_snapshot() {
                    Some((lamps, age)) => {
                        self.metrics.fallbacks.inc();
                        warn!(
                            error = %e,
                            age_secs = age.as_secs(),
                            "Device service unavailable, serving stale lamp snapshot"
                        );
                        Ok(LampListing {
                            lamps,
                            cached: true,
                            notice: Some(STALE_NOTICE.to_string()),
                        })
                    }
                    None => {
                        warn!(error = %e, "Device service unavailable and no usable snapshot");
                        Err(HearthError::UpstreamUnavailable(e.to_string()))
                    }
                }
            }
        }
    }

    /// Whether the last directory call succeeded
    pub fn upstream_healthy(&self) -> bool {
        self.upstream_healthy.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> &CacheMetrics {
        &self.metrics
    }

    fn fresh_snapshot(&self) -> Option<Vec<LampEntry>> {
        let guard = self.snapshot.read();
        let snapshot = guard.as_ref()?;
        (snapshot.captured_at.elapsed() < self.policy.ttl).then(|| snapshot.lamps.clone())
    }

    fn fallback_snapshot(&self) -> Option<(Vec<LampEntry>, Duration)> {
        let guard = self.snapshot.read();
        let snapshot = guard.as_ref()?;
        let age = snapshot.captured_at.elapsed();
        match self.policy.max_staleness {
            Some(limit) if age > limit => None,
            _ => Some((snapshot.lamps.clone(), age)),
        }
    }
}
