//! Gate Service HTTP API

pub mod rest;
