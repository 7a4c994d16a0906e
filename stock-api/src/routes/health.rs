//! Health check endpoint

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use stock_core::HealthStatus;

use crate::AppState;

/// Live probe of the pricing service
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let status = state.stock_service.health_check().await;

    let code = if status.success {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (code, Json(status))
}

/// Create health routes
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
