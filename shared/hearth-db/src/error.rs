//! Database Error Types

use hearth_core::HearthError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<DbError> for HearthError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Configuration(msg) => HearthError::Config(msg),
            other => HearthError::Database(other.to_string()),
        }
    }
}
