pub mod webhook;

use std::net::SocketAddr;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::config::loader::get_settings;
use crate::error::HarperBotError;

/// Build the HTTP router: `GET /` health check plus the webhook endpoint.
pub fn router(webhook_path: &str) -> Router {
    Router::new()
        .route("/", get(health_check))
        .route(webhook_path, post(webhook::handle_github_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024)) // 2 MB
}

/// Start the webhook server on `server.port` (3000 unless overridden by
/// config or the `PORT` env var). Stops on Ctrl-C.
pub async fn start_server() -> Result<(), HarperBotError> {
    let settings = get_settings();
    let app = router(&settings.server.webhook_path);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
    tracing::info!(%addr, path = %settings.server.webhook_path, "starting webhook server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| HarperBotError::Other(format!("failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| HarperBotError::Other(format!("server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down webhook server");
}

/// Health check endpoint: GET /
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({"status": "ok"})),
    )
}
