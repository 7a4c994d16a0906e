//! Stock service
//!
//! Orchestrates validation, the response cache, the pricing service and the
//! aggregation core for the three client-facing operations.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use stock_core::{
    AveragePriceResponse, CorrelationResponse, HealthStatus, PriceHistory, StockError,
    StockList, StockResult, TickerSummary,
};
use stock_upstream::PriceSource;
use tracing::{debug, error, info, instrument};

use crate::aggregation::{self, Aggregation};
use crate::response_cache::ResponseCache;

/// Window used when a request does not name one
pub const DEFAULT_WINDOW_MINUTES: u32 = 60;

/// Cache key for the full stock list
const ALL_STOCKS_KEY: &str = "all_stocks";

/// Time-to-live per payload class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Fallback for payloads without a class of their own
    pub default_ttl: Duration,
    /// The stock list rarely changes
    pub stock_list_ttl: Duration,
    /// Prices are time-sensitive
    pub price_history_ttl: Duration,
}

impl CachePolicy {
    /// How often expired entries should be swept
    pub fn sweep_interval(&self) -> Duration {
        self.default_ttl.min(self.price_history_ttl) / 2
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(60),
            stock_list_ttl: Duration::from_secs(3600),
            price_history_ttl: Duration::from_secs(30),
        }
    }
}

/// Payloads held in the response cache
#[derive(Debug, Clone)]
pub enum CachedPayload {
    Stocks(Arc<StockList>),
    History(Arc<PriceHistory>),
}

/// Cache key for one ticker's history over a window
fn history_key(ticker: &str, minutes: Option<u32>) -> String {
    match minutes {
        Some(m) => format!("history_{}_{}", ticker, m),
        None => format!("history_{}_latest", ticker),
    }
}

/// Key prefix shared by every history entry of a ticker
///
/// History keys live under `history_` so no ticker prefix can reach the
/// stock list entry.
fn ticker_prefix(ticker: &str) -> String {
    format!("history_{}_", ticker)
}

/// Resolve the optional raw window parameter
fn window(raw: Option<&str>) -> StockResult<u32> {
    match raw {
        Some(raw) => aggregation::parse_window(raw),
        None => Ok(DEFAULT_WINDOW_MINUTES),
    }
}

/// Service answering average-price, correlation and listing requests
pub struct StockService {
    source: Arc<dyn PriceSource>,
    cache: Arc<ResponseCache<CachedPayload>>,
    policy: CachePolicy,
}

impl StockService {
    /// Create a new stock service with the default cache policy
    pub fn new(source: Arc<dyn PriceSource>) -> Self {
        Self::with_policy(source, CachePolicy::default())
    }

    pub fn with_policy(source: Arc<dyn PriceSource>, policy: CachePolicy) -> Self {
        Self {
            source,
            cache: Arc::new(ResponseCache::new()),
            policy,
        }
    }

    /// The response cache owned by this service
    pub fn cache(&self) -> &Arc<ResponseCache<CachedPayload>> {
        &self.cache
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// All listed stocks, company name to ticker
    #[instrument(skip(self))]
    pub async fn get_all_stocks(&self) -> StockResult<StockList> {
        if let Some(CachedPayload::Stocks(stocks)) = self.cache.get(ALL_STOCKS_KEY) {
            debug!("Cache hit: {}", ALL_STOCKS_KEY);
            return Ok(stocks.as_ref().clone());
        }

        debug!("Cache miss: {}", ALL_STOCKS_KEY);
        let stocks = self.source.fetch_all_stocks().await?;

        self.cache.set(
            ALL_STOCKS_KEY,
            CachedPayload::Stocks(Arc::new(stocks.clone())),
            self.policy.stock_list_ttl,
        );
        info!(
            "Cached stock list with {} stocks for {:?}",
            stocks.len(),
            self.policy.stock_list_ttl
        );

        Ok(stocks)
    }

    /// Price history of an already validated ticker, served from cache when fresh
    async fn price_history(
        &self,
        ticker: &str,
        minutes: Option<u32>,
    ) -> StockResult<Arc<PriceHistory>> {
        let key = history_key(ticker, minutes);

        if let Some(CachedPayload::History(history)) = self.cache.get(&key) {
            debug!("Cache hit: {}", key);
            return Ok(history);
        }

        debug!("Cache miss: {}", key);
        let history = Arc::new(self.source.fetch_price_history(ticker, minutes).await?);

        self.cache.set(
            key.as_str(),
            CachedPayload::History(Arc::clone(&history)),
            self.policy.price_history_ttl,
        );
        info!(
            "Cached {} data points for {} for {:?}",
            history.len(),
            ticker,
            self.policy.price_history_ttl
        );

        Ok(history)
    }

    /// Average price of `ticker` over the last `minutes` (default 60)
    #[instrument(skip(self))]
    pub async fn get_average_price(
        &self,
        ticker: &str,
        minutes: Option<&str>,
        aggregation: Option<&str>,
    ) -> StockResult<AveragePriceResponse> {
        aggregation::validate_ticker(ticker)?;
        let minutes = window(minutes)?;
        let method = Aggregation::parse(aggregation)?;

        let history = self.price_history(ticker, Some(minutes)).await?;
        let average_stock_price = match method {
            Aggregation::Average => aggregation::average(&history.prices()),
        };

        Ok(AveragePriceResponse {
            average_stock_price,
            price_history: history.as_ref().clone(),
        })
    }

    /// Pearson correlation between exactly two tickers over the last `minutes`
    ///
    /// Both histories are fetched concurrently. The first failure aborts the
    /// request and the other fetch is dropped.
    #[instrument(skip(self))]
    pub async fn get_correlation(
        &self,
        tickers: &[String],
        minutes: Option<&str>,
    ) -> StockResult<CorrelationResponse> {
        let [first, second] = tickers else {
            return Err(StockError::validation(format!(
                "Exactly two stock tickers must be provided, got {}",
                tickers.len()
            )));
        };
        aggregation::validate_ticker(first)?;
        aggregation::validate_ticker(second)?;
        let minutes = window(minutes)?;

        let (history_first, history_second) = tokio::try_join!(
            self.price_history(first, Some(minutes)),
            self.price_history(second, Some(minutes)),
        )?;

        let aligned = aggregation::align_series(&history_first, &history_second);
        let result = aggregation::correlation(&aligned.left, &aligned.right);
        debug!(
            "Correlation {} / {}: {:?} over {} aligned points",
            first, second, result.coefficient, result.sample_size
        );

        let summary = |history: &PriceHistory| TickerSummary {
            average_price: aggregation::average(&history.prices()),
            price_history: history.clone(),
        };

        let mut stocks = BTreeMap::new();
        stocks.insert(first.clone(), summary(history_first.as_ref()));
        stocks.insert(second.clone(), summary(history_second.as_ref()));

        Ok(CorrelationResponse {
            correlation: result.rounded(),
            stocks,
        })
    }

    /// Current quote of `ticker` as a one-element history
    #[instrument(skip(self))]
    pub async fn get_latest_price(&self, ticker: &str) -> StockResult<PriceHistory> {
        aggregation::validate_ticker(ticker)?;
        let history = self.price_history(ticker, None).await?;
        Ok(history.as_ref().clone())
    }

    /// Drop cached entries for one ticker, or everything
    pub fn clear_cache(&self, ticker: Option<&str>) -> usize {
        match ticker {
            Some(ticker) => self.cache.invalidate(Some(&ticker_prefix(ticker))),
            None => self.cache.invalidate(None),
        }
    }

    /// Live probe of the pricing service, bypassing the cache
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> HealthStatus {
        info!("Testing connection to pricing service");

        match self.source.fetch_all_stocks().await {
            Ok(stocks) => HealthStatus {
                success: true,
                stock_count: stocks.len(),
                message: "Connection to stock API successful".to_string(),
                error: None,
            },
            Err(e) => {
                error!("Connection test failed: {}", e);
                HealthStatus {
                    success: false,
                    stock_count: 0,
                    message: format!("Failed to connect to stock API: {}", e),
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
