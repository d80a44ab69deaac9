//! Configuration management for microservices

use crate::error::{HearthError, Result};
use std::env;
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub service_name: String,
    pub http_bind: String,
    pub log_level: String,
}

impl ServiceConfig {
    /// Reads `SERVICE_NAME`, `HTTP_BIND` (or `PORT`) and `LOG_LEVEL`.
    pub fn from_env(default_name: &str, default_port: u16) -> Result<Self> {
        let http_bind = match env::var("HTTP_BIND") {
            Ok(bind) => bind,
            Err(_) => {
                let port: u16 = env_parse("PORT", default_port)?;
                format!("0.0.0.0:{}", port)
            }
        };

        Ok(Self {
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| default_name.to_string()),
            http_bind,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

/// Parse an environment variable, falling back to `default` when unset.
pub fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| HearthError::Config(format!("Invalid {}: {}", key, e))),
        Err(_) => Ok(default),
    }
}

/// Like [`env_parse`] but yields `None` when the variable is unset or empty.
pub fn env_parse_opt<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| HearthError::Config(format!("Invalid {}: {}", key, e))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_default_when_unset() {
        let value: u64 = env_parse("HEARTH_TEST_UNSET_VALUE", 30).unwrap();
        assert_eq!(value, 30);
    }

    #[test]
    fn test_env_parse_rejects_garbage() {
        env::set_var("HEARTH_TEST_GARBAGE_VALUE", "thirty");
        let err = env_parse::<u64>("HEARTH_TEST_GARBAGE_VALUE", 30).unwrap_err();
        assert!(matches!(err, HearthError::Config(_)));
        assert!(err.to_string().contains("HEARTH_TEST_GARBAGE_VALUE"));
    }

    #[test]
    fn test_env_parse_opt_empty_is_none() {
        env::set_var("HEARTH_TEST_EMPTY_VALUE", "  ");
        let value: Option<u64> = env_parse_opt("HEARTH_TEST_EMPTY_VALUE").unwrap();
        assert_eq!(value, None);
    }
}
