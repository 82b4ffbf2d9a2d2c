//! Liveness endpoint for container orchestration.

use anyhow::{Context, Result};
use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

pub fn health_router() -> Router {
    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// Bind `addr` and serve the health routes in a background task
pub async fn spawn_health_server(addr: SocketAddr) -> Result<tokio::task::JoinHandle<()>> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind health server on {addr}"))?;
    info!(%addr, "Health endpoint listening");

    Ok(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, health_router()).await {
            error!(error = %e, "Health server stopped");
        }
    }))
}
