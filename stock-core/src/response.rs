//! Result shapes returned to clients of the proxy

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::price::PriceHistory;

/// Decimal places used when presenting a correlation coefficient
pub const CORRELATION_DECIMALS: i32 = 4;

/// Pearson correlation of two aligned series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResult {
    /// Unrounded coefficient; `None` when there is not enough data or a
    /// series has zero variance
    pub coefficient: Option<f64>,
    /// Number of positions the coefficient was computed over
    pub sample_size: usize,
}

impl CorrelationResult {
    pub fn insufficient(sample_size: usize) -> Self {
        Self {
            coefficient: None,
            sample_size,
        }
    }

    /// Coefficient rounded for presentation
    pub fn rounded(&self) -> Option<f64> {
        let scale = 10f64.powi(CORRELATION_DECIMALS);
        self.coefficient.map(|c| (c * scale).round() / scale)
    }
}

/// Response for the average price endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AveragePriceResponse {
    pub average_stock_price: f64,
    pub price_history: PriceHistory,
}

/// Per-ticker block of a correlation response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSummary {
    pub average_price: f64,
    pub price_history: PriceHistory,
}

/// Response for the correlation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationResponse {
    /// Rounded coefficient, `null` when undefined
    pub correlation: Option<f64>,
    pub stocks: BTreeMap<String, TickerSummary>,
}

/// Result of a live probe against the pricing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub success: bool,
    pub stock_count: usize,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_is_presentation_only() {
        let result = CorrelationResult {
            coefficient: Some(0.123456),
            sample_size: 10,
        };
        assert_eq!(result.rounded(), Some(0.1235));
        assert_eq!(result.coefficient, Some(0.123456));
    }

    #[test]
    fn test_insufficient_serializes_null() {
        let response = CorrelationResponse {
            correlation: CorrelationResult::insufficient(1).rounded(),
            stocks: BTreeMap::new(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert!(value["correlation"].is_null());
    }

    #[test]
    fn test_camel_case_field_names() {
        let response = AveragePriceResponse {
            average_stock_price: 12.5,
            price_history: PriceHistory::default(),
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["averageStockPrice"], 12.5);
        assert!(value["priceHistory"].is_array());

        let health = HealthStatus {
            success: true,
            stock_count: 3,
            message: "ok".to_string(),
            error: None,
        };
        let value = serde_json::to_value(&health).unwrap();
        assert_eq!(value["stockCount"], 3);
        assert!(value.get("error").is_none());
    }
}
