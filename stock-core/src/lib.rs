//! Core types for the stock aggregation proxy
//!
//! This crate defines the shared data structures used across the proxy,
//! including price histories, derived statistics and the error taxonomy.

pub mod error;
pub mod price;
pub mod response;

pub use error::{StockError, StockResult};
pub use price::{PriceHistory, PricePoint, StockList};
pub use response::{
    AveragePriceResponse, CorrelationResponse, CorrelationResult, HealthStatus, TickerSummary,
};
