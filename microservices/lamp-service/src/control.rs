//! Lamp control operations

use hearth_core::{HearthError, Result};
use std::sync::Arc;
use tracing::info;

use crate::cache::{LampCache, LampListing};
use crate::notifier::{TelemetryEvent, TelemetryNotifier};
use crate::store::LampStateStore;
use crate::types::{LampState, Power};

pub const MAX_BRIGHTNESS: i64 = 100;

/// Owns the state store, the listing cache and the telemetry notifier.
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct LampService {
    store: LampStateStore,
    cache: Arc<LampCache>,
    notifier: TelemetryNotifier,
}

impl LampService {
    pub fn new(store: LampStateStore, cache: Arc<LampCache>, notifier: TelemetryNotifier) -> Self {
        Self {
            store,
            cache,
            notifier,
        }
    }

    pub async fn list_lamps(&self) -> Result<LampListing> {
        self.cache.list_lamps().await
    }

    /// Flip the power of a lamp and return the new value
    pub fn toggle_power(&self, lamp_id: &str) -> Power {
        let state = self.store.update(lamp_id, |s| s.power = s.power.toggled());
        info!(lamp_id, power = %state.power, "Lamp toggled");

        self.notifier.notify(TelemetryEvent::lamp_state(lamp_id, state.power));
        state.power
    }

    /// Set brightness; power follows (on above zero, off at zero)
    pub fn set_brightness(&self, lamp_id: &str, brightness: i64) -> Result<LampState> {
        let level = u8::try_from(brightness)
            .ok()
            .filter(|b| i64::from(*b) <= MAX_BRIGHTNESS)
            .ok_or_else(|| HearthError::Validation("Brightness must be between 0 and 100".to_string()))?;

        let state = self.store.update(lamp_id, |s| {
            s.brightness = level;
            s.power = Power::for_brightness(level);
        });
        info!(lamp_id, brightness = level, power = %state.power, "Lamp brightness set");

        self.notifier.notify(TelemetryEvent::brightness(lamp_id, level));
        Ok(state)
    }

    pub fn lamp_state(&self, lamp_id: &str) -> LampState {
        self.store.get(lamp_id)
    }

    pub fn cache(&self) -> &LampCache {
        &self.cache
    }

    pub fn notifier(&self) -> &TelemetryNotifier {
        &self.notifier
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CachePolicy;
    use crate::testing::{RecordingSink, StubDirectory};
    use crate::types::Color;

    fn service_with(sink: Arc<RecordingSink>) -> LampService {
        let store = LampStateStore::new();
        let directory = Arc::new(StubDirectory::with_lamps(&["l1"]));
        let cache = Arc::new(LampCache::new(directory, store.clone(), CachePolicy::default()));
        let (notifier, _handle) = TelemetryNotifier::spawn(sink, 16);
        LampService::new(store, cache, notifier)
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_power() {
        let service = service_with(Arc::new(RecordingSink::default()));
        let original = service.lamp_state("l1").power;

        assert_eq!(service.toggle_power("l1"), Power::On);
        assert_eq!(service.toggle_power("l1"), original);
    }

    #[tokio::test]
    async fn test_toggle_keeps_brightness_and_color() {
        let service = service_with(Arc::new(RecordingSink::default()));
        service.set_brightness("l1", 30).unwrap();

        service.toggle_power("l1");
        let state = service.lamp_state("l1");
        assert_eq!(state.power, Power::Off);
        assert_eq!(state.brightness, 30);
        assert_eq!(state.color, Color::default());
    }

    #[tokio::test]
    async fn test_brightness_drives_power() {
        let service = service_with(Arc::new(RecordingSink::default()));

        assert_eq!(service.set_brightness("l1", 0).unwrap().power, Power::Off);
        for level in 1..=100 {
            let state = service.set_brightness("l1", level).unwrap();
            assert_eq!(state.power, Power::On);
            assert_eq!(i64::from(state.brightness), level);
        }
        assert_eq!(service.set_brightness("l1", 0).unwrap().power, Power::Off);
    }

    #[tokio::test]
    async fn test_out_of_range_brightness_is_rejected_without_mutation() {
        let service = service_with(Arc::new(RecordingSink::default()));
        service.set_brightness("l1", 70).unwrap();
        let before = service.lamp_state("l1");

        for level in [-1, 101, i64::MAX, i64::MIN] {
            let err = service.set_brightness("l1", level).unwrap_err();
            assert!(matches!(err, HearthError::Validation(_)));
        }
        assert_eq!(service.lamp_state("l1"), before);

        assert!(service.set_brightness("never-touched", 101).is_err());
        assert!(!service.store.contains("never-touched"));
    }

    #[tokio::test]
    async fn test_mutations_emit_telemetry() {
        let sink = Arc::new(RecordingSink::default());
        let store = LampStateStore::new();
        let directory = Arc::new(StubDirectory::with_lamps(&[]));
        let cache = Arc::new(LampCache::new(directory, store.clone(), CachePolicy::default()));
        let (notifier, handle) = TelemetryNotifier::spawn(sink.clone(), 16);
        let service = LampService::new(store, cache, notifier);

        service.toggle_power("l7");
        service.set_brightness("l7", 0).unwrap();
        drop(service);
        handle.await.unwrap();

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], TelemetryEvent::lamp_state("l7", Power::On));
        assert_eq!(events[1], TelemetryEvent::brightness("l7", 0));
    }
}
