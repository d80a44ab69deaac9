//! Telemetry Service HTTP API

pub mod rest;
