//! Pricing service API client
//!
//! Every request goes through [`UpstreamClient::send_authorized`], which
//! attaches the current bearer credential, logs the exchange and turns
//! non-success responses into errors carrying the upstream status and body.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use stock_core::{PriceHistory, PricePoint, StockError, StockList, StockResult};
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::auth::CredentialCache;
use crate::config::UpstreamConfig;
use crate::source::PriceSource;
use crate::types::{QuoteResponse, StocksResponse};

/// Pricing service API client
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
    credentials: Arc<CredentialCache>,
}

impl UpstreamClient {
    /// Create a new client sharing the given credential cache
    pub fn new(config: &UpstreamConfig, credentials: Arc<CredentialCache>) -> StockResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            StockError::config(format!("Invalid base URL {}: {}", config.base_url, e))
        })?;

        if base_url.cannot_be_a_base() {
            return Err(StockError::config(format!(
                "Base URL cannot carry paths: {}",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StockError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// The credential cache shared by every request of this client
    pub fn credentials(&self) -> &Arc<CredentialCache> {
        &self.credentials
    }

    /// Build an endpoint URL from path segments below the base URL
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Attach the bearer credential, send, and check the response status
    async fn send_authorized(&self, request: RequestBuilder) -> StockResult<Response> {
        let token = self.credentials.get_valid_credential().await?;
        let request = request
            .bearer_auth(token)
            .build()
            .map_err(|e| StockError::internal(format!("Failed to build request: {}", e)))?;

        debug!("API request: {} {}", request.method(), request.url());

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| StockError::network(format!("Request to pricing service failed: {}", e)))?;

        let status = response.status();
        debug!("API response: {}", status);

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            warn!("Pricing service rejected credential: {}", body);
            self.credentials.invalidate();
            return Err(StockError::auth(format!(
                "Pricing service rejected credential: {}",
                body
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("API error response: {} - {}", status, body);
            return Err(StockError::upstream(status.as_u16(), body));
        }

        Ok(response)
    }

    /// GET an endpoint and decode its JSON body
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> StockResult<T> {
        let response = self.send_authorized(self.client.get(url)).await?;

        let body = response
            .text()
            .await
            .map_err(|e| StockError::network(format!("Failed to read response body: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            error!("Malformed response body: {}", body);
            StockError::parse(format!("Failed to parse response: {}", e))
        })
    }

    /// List every stock the pricing service knows about
    #[instrument(skip(self))]
    pub async fn fetch_all_stocks(&self) -> StockResult<StockList> {
        let url = self.endpoint(&["stocks"]);
        debug!("Fetching all stocks from: {}", url);

        let response: StocksResponse = self.get_json(url).await?;

        info!("Fetched {} stocks", response.stocks.len());
        Ok(response.stocks)
    }

    /// Fetch the price history of one ticker
    ///
    /// Without `minutes` the pricing service returns only the current quote,
    /// which is wrapped into a one-element history.
    #[instrument(skip(self))]
    pub async fn fetch_price_history(
        &self,
        ticker: &str,
        minutes: Option<u32>,
    ) -> StockResult<PriceHistory> {
        let mut url = self.endpoint(&["stocks", ticker]);

        let history = match minutes {
            Some(m) => {
                url.query_pairs_mut().append_pair("minutes", &m.to_string());
                debug!("Fetching price history for {} over {} minutes", ticker, m);
                let points: Vec<PricePoint> = self.get_json(url).await?;
                PriceHistory::new(points)
            }
            None => {
                debug!("Fetching current quote for {}", ticker);
                let quote: QuoteResponse = self.get_json(url).await?;
                PriceHistory::from_quote(quote.stock)
            }
        };

        info!("Retrieved {} data points for {}", history.len(), ticker);
        Ok(history)
    }
}

#[async_trait]
impl PriceSource for UpstreamClient {
    async fn fetch_all_stocks(&self) -> StockResult<StockList> {
        UpstreamClient::fetch_all_stocks(self).await
    }

    async fn fetch_price_history(
        &self,
        ticker: &str,
        minutes: Option<u32>,
    ) -> StockResult<PriceHistory> {
        UpstreamClient::fetch_price_history(self, ticker, minutes).await
    }
}
