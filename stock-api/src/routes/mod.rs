//! API route definitions

mod health;
mod stocks;

use axum::Router;
use crate::AppState;

/// Create all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(stocks::routes())
        .merge(health::routes())
}
