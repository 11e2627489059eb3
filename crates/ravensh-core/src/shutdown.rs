//! Graceful shutdown
//!
//! Background tasks take a child token from the [`ShutdownController`];
//! the server triggers it once a termination signal arrives.
//!
//! ## Usage
//!
//! ```ignore
//! let shutdown = ShutdownController::new();
//! let reaper = spawn_reaper(manager.clone(), shutdown.token());
//!
//! axum::serve(listener, app)
//!     .with_graceful_shutdown(shutdown_signal_with_controller(shutdown.clone()))
//!     .await?;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Coordinates cancellation of background work.
#[derive(Debug, Default)]
pub struct ShutdownController {
    cancel_token: CancellationToken,
    shutdown_initiated: AtomicBool,
}

impl ShutdownController {
    /// Create a new controller
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Get a cancellation token for a component
    #[must_use]
    pub fn token(&self) -> CancellationToken {
        self.cancel_token.child_token()
    }

    /// Cancel every issued token. Subsequent calls are no-ops.
    pub fn shutdown(&self) {
        if self
            .shutdown_initiated
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Shutdown already initiated");
            return;
        }

        info!("Initiating graceful shutdown...");
        self.cancel_token.cancel();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
pub async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}

/// Create a shutdown signal future that integrates with ShutdownController
pub async fn shutdown_signal_with_controller(controller: Arc<ShutdownController>) {
    wait_for_shutdown_signal().await;
    controller.shutdown();
}
