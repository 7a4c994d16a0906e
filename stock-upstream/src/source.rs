//! Seam between the orchestration layer and the pricing service

use async_trait::async_trait;
use stock_core::{PriceHistory, StockList, StockResult};

/// Anything that can supply stock listings and price histories
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// All listed stocks, company name to ticker
    async fn fetch_all_stocks(&self) -> StockResult<StockList>;

    /// Quotes for `ticker` over the last `minutes`, or the current quote
    /// as a one-element history when `minutes` is `None`
    async fn fetch_price_history(
        &self,
        ticker: &str,
        minutes: Option<u32>,
    ) -> StockResult<PriceHistory>;
}
