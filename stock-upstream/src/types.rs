//! Wire types for the pricing service REST API

use serde::{Deserialize, Serialize};
use stock_core::{PricePoint, StockList};

/// Body posted to `/auth`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthRequest {
    pub email: String,
    pub name: String,
    pub roll_no: String,
    pub access_code: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: String,
}

/// Response from `/auth`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    /// Credential lifetime in seconds
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Response from `GET /stocks`
#[derive(Debug, Clone, Deserialize)]
pub struct StocksResponse {
    #[serde(default)]
    pub stocks: StockList,
}

/// Response from `GET /stocks/{ticker}` without a window
#[derive(Debug, Clone, Deserialize)]
pub struct QuoteResponse {
    pub stock: PricePoint,
}
