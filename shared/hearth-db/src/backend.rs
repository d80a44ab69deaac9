//! Storage backend selection

use crate::{DbError, Result};

/// Where a service keeps its records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// Process-local, lost on restart
    Memory,
}

impl StorageBackend {
    /// Reads `key`; unset means PostgreSQL
    pub fn from_env(key: &str) -> Result<Self> {
        match std::env::var(key) {
            Err(_) => Ok(Self::Postgres),
            Ok(value) => Self::parse(&value)
                .ok_or_else(|| DbError::Configuration(format!("Invalid {}: {}", key, value))),
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Some(Self::Postgres),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}
