//! Mapping of service errors onto HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use stock_core::StockError;
use tracing::error;

/// Error returned by route handlers
#[derive(Debug)]
pub struct ApiError(pub StockError);

impl From<StockError> for ApiError {
    fn from(e: StockError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            StockError::Validation(_) => StatusCode::BAD_REQUEST,
            StockError::Auth(_) => StatusCode::BAD_GATEWAY,
            e if e.is_upstream_failure() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = json!({ "error": { "message": self.0.to_string() } });
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError(StockError::validation("x")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError(StockError::auth("x")).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ApiError(StockError::upstream(500, "x")).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError(StockError::internal("x")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
