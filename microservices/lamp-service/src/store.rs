//! Lamp State Store
//!
//! In-process map from lamp id to its last known state. Entries are created
//! on first mutation and live for the lifetime of the process; nothing is
//! persisted across restarts.

use dashmap::DashMap;
use std::sync::Arc;

use crate::types::LampState;

#[derive(Clone, Default)]
pub struct LampStateStore {
    lamps: Arc<DashMap<String, LampState>>,
}

impl LampStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored state, or the default if the lamp was never mutated.
    /// Does not create an entry.
    pub fn get(&self, lamp_id: &str) -> LampState {
        self.lamps
            .get(lamp_id)
            .map(|entry| *entry.value())
            .unwrap_or_default()
    }

    /// Replace the state wholesale
    pub fn set(&self, lamp_id: &str, state: LampState) {
        self.lamps.insert(lamp_id.to_string(), state);
    }

    /// Read-modify-write of a single lamp while holding its shard lock, so
    /// concurrent updates of the same id are never lost.
    pub fn update<F>(&self, lamp_id: &str, f: F) -> LampState
    where
        F: FnOnce(&mut LampState),
    {
        let mut entry = self.lamps.entry(lamp_id.to_string()).or_default();
        f(entry.value_mut());
        *entry.value()
    }

    pub fn contains(&self, lamp_id: &str) -> bool {
        self.lamps.contains_key(lamp_id)
    }

    pub fn len(&self) -> usize {
        self.lamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lamps.is_empty()
    }
}
