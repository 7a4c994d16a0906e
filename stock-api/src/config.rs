//! Server configuration

use std::env;
use std::time::Duration;

/// Port used when neither SERVER_PORT nor PORT is set
pub const DEFAULT_PORT: u16 = 3000;

/// HTTP server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    /// Overrides the cache policy's sweep interval
    pub sweep_interval: Option<Duration>,
}

impl ServerConfig {
    /// Load server configuration from environment variables
    ///
    /// Expects:
    /// - SERVER_PORT or PORT: listen port (optional)
    /// - CACHE_SWEEP_SECS: expired-entry sweep period (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match get("SERVER_PORT").or_else(|| get("PORT")) {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                field: "SERVER_PORT".to_string(),
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let sweep_interval = match get("CACHE_SWEEP_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "CACHE_SWEEP_SECS".to_string(),
                        value: raw,
                    })
                }
            },
            None => None,
        };

        Ok(Self {
            port,
            sweep_interval,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}
