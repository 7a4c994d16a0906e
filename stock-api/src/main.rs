//! Stock Aggregation Proxy API Server
//!
//! HTTP API server that shields the pricing service behind a response cache
//! and serves average-price and correlation statistics.

mod config;
mod error;
mod routes;

use axum::{
    http::{header, Method},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use stock_services::StockService;
use stock_upstream::{CredentialCache, UpstreamClient, UpstreamConfig};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ServerConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub stock_service: Arc<StockService>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env.local, then .env
    for file in [".env.local", ".env"] {
        if let Err(e) = dotenvy::from_filename(file) {
            // Not an error if the file doesn't exist
            if !matches!(e, dotenvy::Error::Io(_)) {
                eprintln!("Warning: Failed to load {}: {}", file, e);
            }
        }
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,stock_api=debug,stock_services=debug,stock_upstream=debug")
        }))
        .init();

    info!("Starting Stock Aggregation Proxy");

    let upstream_config = UpstreamConfig::from_env()?;
    let server_config = ServerConfig::from_env()?;
    info!("Pricing service base URL: {}", upstream_config.base_url);

    if upstream_config.static_token.is_some() {
        info!("Using static AUTH_TOKEN for the pricing service");
    }

    // Credential cache and client are owned by the one service instance
    let credentials = Arc::new(CredentialCache::new(upstream_config.issuer()?));
    let client = UpstreamClient::new(&upstream_config, credentials)?;
    let stock_service = Arc::new(StockService::new(Arc::new(client)));

    let sweep_interval = server_config
        .sweep_interval
        .unwrap_or_else(|| stock_service.policy().sweep_interval());
    let _sweeper = stock_service.cache().spawn_sweeper(sweep_interval);

    // Probe the pricing service in the background on startup
    let service_for_probe = Arc::clone(&stock_service);
    tokio::spawn(async move {
        let status = service_for_probe.health_check().await;
        if status.success {
            info!("Connected to stock API - found {} stocks", status.stock_count);
        } else {
            warn!("Startup probe failed: {}", status.message);
        }
    });

    let state = AppState { stock_service };

    // Configure CORS for the dashboard
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    // Build router
    let app = Router::new()
        .merge(routes::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], server_config.port));
    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}
