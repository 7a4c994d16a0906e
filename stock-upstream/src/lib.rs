//! Pricing service integration for the stock aggregation proxy
//!
//! This crate provides an authenticated client for the upstream pricing
//! service, together with the cached bearer credential it attaches to
//! every outbound request.

pub mod auth;
pub mod client;
pub mod config;
pub mod source;
pub mod types;

pub use auth::{
    CredentialCache, CredentialIssuer, HttpCredentialIssuer, IssuedCredential, StaticIssuer,
    DEFAULT_SAFETY_MARGIN,
};
pub use client::UpstreamClient;
pub use config::{AuthIdentity, ConfigError, UpstreamConfig};
pub use source::PriceSource;
