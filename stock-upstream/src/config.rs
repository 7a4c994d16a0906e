//! Pricing service configuration

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{CredentialIssuer, HttpCredentialIssuer, StaticIssuer};

/// Default pricing service base URL
pub const DEFAULT_BASE_URL: &str = "http://20.244.56.144/evaluation-service";

/// Default timeout applied to every outbound call
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Identity fields posted to the credential issuer
#[derive(Debug, Clone)]
pub struct AuthIdentity {
    pub email: String,
    pub name: String,
    pub roll_no: String,
    pub access_code: String,
    pub client_id: String,
    pub client_secret: String,
}

/// Configuration for talking to the pricing service
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    /// Credentials for `/auth`; unused when `static_token` is set
    pub identity: Option<AuthIdentity>,
    /// Pre-issued bearer token that never expires
    pub static_token: Option<String>,
    pub timeout: Duration,
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            identity: None,
            static_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Load configuration from environment variables
    ///
    /// Expects:
    /// - STOCK_API_BASE_URL: pricing service root (optional)
    /// - AUTH_TOKEN: static bearer token (optional)
    /// - CLIENT_ID / CLIENT_SECRET: issuer credentials, required without AUTH_TOKEN
    /// - AUTH_EMAIL, AUTH_NAME, AUTH_ROLL_NO, AUTH_ACCESS_CODE: issuer identity
    /// - UPSTREAM_TIMEOUT_SECS: outbound timeout (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let base_url = get("STOCK_API_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let timeout = match get("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "UPSTREAM_TIMEOUT_SECS".to_string(),
                    value: raw.clone(),
                })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let static_token = get("AUTH_TOKEN");

        let identity = match (get("CLIENT_ID"), get("CLIENT_SECRET")) {
            (Some(client_id), Some(client_secret)) => Some(AuthIdentity {
                email: get("AUTH_EMAIL").unwrap_or_default(),
                name: get("AUTH_NAME").unwrap_or_default(),
                roll_no: get("AUTH_ROLL_NO").unwrap_or_default(),
                access_code: get("AUTH_ACCESS_CODE").unwrap_or_default(),
                client_id,
                client_secret,
            }),
            _ => None,
        };

        if static_token.is_none() && identity.is_none() {
            return Err(ConfigError::MissingCredentials);
        }

        Ok(Self {
            base_url,
            identity,
            static_token,
            timeout,
        })
    }

    /// Build the credential issuer this configuration describes
    pub fn issuer(&self) -> Result<Arc<dyn CredentialIssuer>, ConfigError> {
        if let Some(token) = &self.static_token {
            return Ok(Arc::new(StaticIssuer::new(token.clone())));
        }

        let identity = self.identity.clone().ok_or(ConfigError::MissingCredentials)?;
        let issuer = HttpCredentialIssuer::new(&self.base_url, identity, self.timeout)
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Arc::new(issuer))
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Either AUTH_TOKEN or CLIENT_ID and CLIENT_SECRET must be set")]
    MissingCredentials,

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_client_credentials() {
        let config =
            UpstreamConfig::from_lookup(lookup(&[("CLIENT_ID", "id"), ("CLIENT_SECRET", "s")]))
                .unwrap();

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(config.static_token.is_none());
        let identity = config.identity.unwrap();
        assert_eq!(identity.client_id, "id");
        assert_eq!(identity.email, "");
    }

    #[test]
    fn test_static_token_is_enough() {
        let config = UpstreamConfig::from_lookup(lookup(&[
            ("AUTH_TOKEN", "abc"),
            ("STOCK_API_BASE_URL", "http://localhost:9000"),
        ]))
        .unwrap();

        assert_eq!(config.static_token.as_deref(), Some("abc"));
        assert_eq!(config.base_url, "http://localhost:9000");
        assert!(config.identity.is_none());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = UpstreamConfig::from_lookup(lookup(&[("CLIENT_ID", "id")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials));
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let err = UpstreamConfig::from_lookup(lookup(&[
            ("AUTH_TOKEN", "abc"),
            ("UPSTREAM_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
