//! Idle session reaper

use crate::session::SessionManager;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Start the reaper with the manager's configured interval and threshold.
pub fn spawn_reaper(manager: Arc<SessionManager>, token: CancellationToken) -> JoinHandle<()> {
    let interval = manager.config().reap_interval();
    let idle_timeout = manager.config().idle_timeout();
    spawn_reaper_with(manager, interval, idle_timeout, token)
}

/// Start a reaper that evicts sessions idle longer than `idle_timeout`
/// every `interval`, until `token` is cancelled.
pub fn spawn_reaper_with(
    manager: Arc<SessionManager>,
    interval: Duration,
    idle_timeout: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick fires immediately.
        ticker.tick().await;

        info!(
            interval_secs = interval.as_secs_f64(),
            idle_timeout_secs = idle_timeout.as_secs(),
            "Session reaper started"
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!("Session reaper stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let evicted = manager.reap_idle(idle_timeout).await;
                    if evicted > 0 {
                        info!(evicted, "Reaped idle sessions");
                    }
                }
            }
        }
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::session::{SessionConfig, SessionKey};
    use ravensh_exec::InterpreterCommand;

    #[tokio::test]
    async fn test_reaper_evicts_idle_and_keeps_active() {
        let manager = Arc::new(SessionManager::new(
            InterpreterCommand::new("sh"),
            SessionConfig::default(),
        ));
        let idle = SessionKey::new("idle");
        let busy = SessionKey::new("busy");
        manager.get_or_create(&idle).await.unwrap();
        manager.get_or_create(&busy).await.unwrap();

        let token = CancellationToken::new();
        let handle = spawn_reaper_with(
            manager.clone(),
            Duration::from_millis(50),
            Duration::from_millis(300),
            token.clone(),
        );

        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(50)).await;
            manager.get_or_create(&busy).await.unwrap();
        }

        assert!(!manager.contains(&idle).await);
        assert!(manager.contains(&busy).await);

        token.cancel();
        handle.await.unwrap();
        manager.shutdown_all().await;
    }

    #[tokio::test]
    async fn test_reaper_stops_on_cancel() {
        let manager = Arc::new(SessionManager::new(
            InterpreterCommand::new("sh"),
            SessionConfig::default(),
        ));
        let token = CancellationToken::new();
        let handle = spawn_reaper(manager, token.clone());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
