//! Price data types shared between the upstream client and the services

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Mapping of company name to ticker symbol, as listed by the pricing service
pub type StockList = BTreeMap<String, String>;

/// A single quote received from the pricing service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricePoint {
    /// Quoted price
    pub price: f64,
    /// Traded volume, when the pricing service reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,
    /// When the quote was taken
    pub last_updated_at: DateTime<Utc>,
}

impl PricePoint {
    pub fn new(price: f64, last_updated_at: DateTime<Utc>) -> Self {
        Self {
            price,
            volume: None,
            last_updated_at,
        }
    }
}

/// Price history for one ticker over a requested window
///
/// Serialises as a bare JSON array of quotes. Never mutated once built;
/// a refetch replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceHistory {
    points: Vec<PricePoint>,
}

impl PriceHistory {
    pub fn new(points: Vec<PricePoint>) -> Self {
        Self { points }
    }

    /// Wrap a single current quote so consumers always see a sequence
    pub fn from_quote(point: PricePoint) -> Self {
        Self {
            points: vec![point],
        }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Prices in the order they were received
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Quotes ordered by timestamp ascending (oldest first)
    ///
    /// Quotes sharing a timestamp are ordered by price, so the result does
    /// not depend on the order the quotes arrived in.
    pub fn sorted_by_time(&self) -> Vec<&PricePoint> {
        let mut sorted: Vec<&PricePoint> = self.points.iter().collect();
        sorted.sort_by(|a, b| {
            a.last_updated_at
                .cmp(&b.last_updated_at)
                .then(a.price.total_cmp(&b.price))
        });
        sorted
    }
}

impl From<Vec<PricePoint>> for PriceHistory {
    fn from(points: Vec<PricePoint>) -> Self {
        Self::new(points)
    }
}
