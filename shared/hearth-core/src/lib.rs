//! Hearth Core - Shared service infrastructure for the home automation services
//!
//! This crate provides:
//! - Standard service trait every microservice implements
//! - Error taxonomy shared by all HTTP handlers
//! - The `{success, data, error}` response envelope
//! - Environment based configuration and service discovery

pub mod config;
pub mod discovery;
pub mod error;
pub mod response;
pub mod service;

pub use config::ServiceConfig;
pub use discovery::ServiceDiscovery;
pub use error::{HearthError, Result};
pub use response::{ApiResponse, HealthReport};
pub use service::{probe_router, DependencyStatus, HearthService, MicroserviceRuntime, ReadinessStatus};
