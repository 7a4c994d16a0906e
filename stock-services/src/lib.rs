//! Business logic services for the stock aggregation proxy
//!
//! This crate provides the response cache, the numeric aggregation core
//! and the service layer that ties them to the pricing service.

pub mod aggregation;
pub mod response_cache;
pub mod stock_service;

pub use aggregation::{AlignedSeries, Aggregation};
pub use response_cache::{CacheStats, ResponseCache};
pub use stock_service::{CachePolicy, CachedPayload, StockService, DEFAULT_WINDOW_MINUTES};
