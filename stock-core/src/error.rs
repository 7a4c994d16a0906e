//! Error types for the stock proxy

use thiserror::Error;

/// Proxy-wide error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StockError {
    /// Malformed client input. Raised before any cache or upstream access.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    /// Non-success status from the pricing service
    #[error("Upstream error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StockError {
    pub fn validation(msg: impl Into<String>) -> Self {
        StockError::Validation(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        StockError::Auth(msg.into())
    }

    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        StockError::Upstream {
            status,
            body: body.into(),
        }
    }

    pub fn network(msg: impl Into<String>) -> Self {
        StockError::Network(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        StockError::Parse(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        StockError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        StockError::Internal(msg.into())
    }

    /// Whether the caller is at fault (maps to a 4xx response)
    pub fn is_client_error(&self) -> bool {
        matches!(self, StockError::Validation(_))
    }

    /// Whether the failure originated at or on the way to the pricing service
    pub fn is_upstream_failure(&self) -> bool {
        matches!(
            self,
            StockError::Upstream { .. } | StockError::Network(_) | StockError::Parse(_)
        )
    }
}

/// Result type alias for proxy operations
pub type StockResult<T> = Result<T, StockError>;
