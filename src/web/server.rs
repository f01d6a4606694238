//! HTTP server
//!
//! Builds the axum application and serves it until Ctrl+C.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServiceConfig;

use super::routes;

/// Shared application state
pub struct AppState {
    pub config: ServiceConfig,
}

/// Build the application with every route and middleware attached
pub fn router(config: ServiceConfig) -> Router {
    let state = Arc::new(AppState { config });

    Router::new()
        .merge(routes::api_routes())
        .merge(routes::static_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the web server and serve until interrupted
pub async fn start_server(config: ServiceConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let open_browser = config.server.open_browser;

    let listener = TcpListener::bind((host.as_str(), port)).await?;
    let url = format!("http://{}", listener.local_addr()?);
    info!(%url, "distance-server listening");

    if open_browser {
        if let Err(e) = open::that(&url) {
            warn!(error = %e, "could not open browser, please open {} manually", url);
        }
    }

    axum::serve(listener, router(config))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown requested");
}
