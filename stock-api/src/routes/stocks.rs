//! Stock endpoints: listing, average price and pairwise correlation

use axum::{
    extract::{Path, Query, RawQuery, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use stock_core::{AveragePriceResponse, CorrelationResponse, StockList};
use tracing::info;
use url::form_urlencoded;

use crate::error::ApiError;
use crate::AppState;

/// Query parameters for the average price endpoint
#[derive(Debug, Deserialize)]
pub struct AverageQuery {
    /// Window length in minutes (default 60)
    pub minutes: Option<String>,
    /// Aggregation method; only "average" is supported
    pub aggregation: Option<String>,
}

/// Response for listing stocks
#[derive(Debug, Serialize)]
pub struct StocksResponse {
    pub stocks: StockList,
}

/// Query parameters for the correlation endpoint
///
/// Tickers may be repeated as `ticker=` or `ticker[]=`.
#[derive(Debug, Default, PartialEq)]
pub struct CorrelationQuery {
    pub tickers: Vec<String>,
    pub minutes: Option<String>,
}

impl CorrelationQuery {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();

        for (key, value) in form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            match key.as_ref() {
                "ticker" | "ticker[]" => query.tickers.push(value.into_owned()),
                "minutes" => query.minutes = Some(value.into_owned()),
                _ => {}
            }
        }

        query
    }
}

/// Create stock routes
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/stocks", get(list_stocks))
        .route("/stocks/{ticker}", get(average_price))
        .route("/stockcorrelation", get(correlation))
}

/// List every stock known to the pricing service
async fn list_stocks(State(state): State<AppState>) -> Result<Json<StocksResponse>, ApiError> {
    let stocks = state.stock_service.get_all_stocks().await?;
    info!("Returning {} stocks", stocks.len());
    Ok(Json(StocksResponse { stocks }))
}

/// Average price of one ticker over a window
async fn average_price(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
    Query(params): Query<AverageQuery>,
) -> Result<Json<AveragePriceResponse>, ApiError> {
    let response = state
        .stock_service
        .get_average_price(
            &ticker,
            params.minutes.as_deref(),
            params.aggregation.as_deref(),
        )
        .await?;
    Ok(Json(response))
}

/// Correlation between exactly two tickers over a window
async fn correlation(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<CorrelationResponse>, ApiError> {
    let query = CorrelationQuery::parse(raw.as_deref());
    let response = state
        .stock_service
        .get_correlation(&query.tickers, query.minutes.as_deref())
        .await?;
    Ok(Json(response))
}
