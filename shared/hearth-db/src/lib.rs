//! Hearth DB
//!
//! PostgreSQL connection pooling for the services that log to a relational
//! store. Schemas are managed outside this workspace.

mod backend;
mod error;
mod pool;

pub use backend::StorageBackend;
pub use error::{DbError, Result};
pub use pool::{DbPool, PoolConfig};

/// Re-export tokio-postgres types for convenience
pub use tokio_postgres::{Error as PgError, Row};
