//! Health check endpoint

use axum::extract::Extension;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use ravensh_core::SessionManager;
use serde::Serialize;
use std::sync::Arc;

/// Health response with session counters
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sessions: usize,
    pub spawned_total: u64,
}

async fn health_check(
    Extension(sessions): Extension<Arc<SessionManager>>,
) -> Json<HealthResponse> {
    let stats = sessions.stats().await;
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        sessions: stats.active,
        spawned_total: stats.spawned_total,
    })
}

pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}
