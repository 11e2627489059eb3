//! Server initialization
//!
//! Contains the main `run()` function that starts all server components.

use super::config::AppConfig;
use crate::middleware::{ClientSessionLayer, CookieSettings};
use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    Extension, Router,
};
use ravensh_core::{shutdown_signal_with_controller, spawn_reaper, SessionManager, ShutdownController};
use ravensh_exec::ProgramRunner;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};

/// How long the reaper gets to stop after shutdown is signalled.
const REAPER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Build the one-shot runner from configuration
pub fn build_runner(config: &AppConfig) -> ProgramRunner {
    let runner = ProgramRunner::new(config.interpreter.command(), config.execution.limits());
    match config.execution.scratch_dir {
        Some(ref dir) => runner.with_scratch_dir(dir),
        None => runner,
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "Skipping invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Assemble the full router with all layers
pub fn build_router(
    config: &AppConfig,
    sessions: Arc<SessionManager>,
    runner: Arc<ProgramRunner>,
) -> Router {
    let cookies = CookieSettings {
        name: config.server.cookie_name.clone(),
        max_age_secs: config.server.cookie_max_age_secs,
        cross_site: config.server.cookie_cross_site,
    };

    Router::new()
        .merge(crate::api::api_router().layer(ClientSessionLayer::new(cookies)))
        .merge(crate::api::health_routes())
        .layer(Extension(sessions))
        .layer(Extension(runner))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(config))
}

/// Run the server
pub async fn run(config: AppConfig) -> Result<()> {
    info!(
        interpreter = %config.interpreter.command(),
        idle_timeout_secs = config.session.idle_timeout_secs,
        "Starting ravensh server"
    );

    let sessions = Arc::new(SessionManager::new(
        config.interpreter.command(),
        config.session.clone(),
    ));
    let runner = Arc::new(build_runner(&config));

    let shutdown_controller = ShutdownController::new();
    let reaper = spawn_reaper(sessions.clone(), shutdown_controller.token());

    let app = build_router(&config, sessions.clone(), runner);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server listening on http://{}", addr);

    let server_shutdown = shutdown_controller.clone();
    let served = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal_with_controller(server_shutdown))
    .await
    .context("HTTP server error");

    // The server may also stop on an error; make sure background work ends.
    shutdown_controller.shutdown();

    match tokio::time::timeout(REAPER_STOP_TIMEOUT, reaper).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!("Session reaper task error: {}", e),
        Err(_) => warn!("Session reaper shutdown timeout"),
    }

    let stopped = sessions.shutdown_all().await;
    info!(stopped, "ravensh shutdown complete");

    served
}
