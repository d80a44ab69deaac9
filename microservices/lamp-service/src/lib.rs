//! Lamp Service
//!
//! Lamp state and listing proxy:
//! - In-process lamp state (power, brightness, color)
//! - Cached lamp listing backed by the device service, tolerant of outages
//! - Toggle and brightness control with telemetry forwarding

pub mod api;
pub mod cache;
pub mod config;
pub mod control;
pub mod directory;
pub mod notifier;
pub mod server;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::LampServiceConfig;
pub use control::LampService;
pub use server::LampServer;
