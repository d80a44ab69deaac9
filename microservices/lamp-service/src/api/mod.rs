//! Lamp Service HTTP API

pub mod rest;
