//! Session table

use super::{SessionConfig, SessionKey, SessionOutput, SessionStats};
use crate::error::{Error, Result};
use ravensh_exec::{InterpreterCommand, InterpreterProcess};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Owns every interactive interpreter.
///
/// The table lock is held across lookup, spawn and insert, so concurrent
/// requests for an unseen key start exactly one process. Per-process I/O
/// runs outside the table lock.
pub struct SessionManager {
    sessions: Mutex<HashMap<SessionKey, Arc<InterpreterProcess>>>,
    command: InterpreterCommand,
    config: SessionConfig,
    spawned: AtomicU64,
}

impl SessionManager {
    /// Create an empty table that starts `command` for new sessions.
    pub fn new(command: InterpreterCommand, config: SessionConfig) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            command,
            config,
            spawned: AtomicU64::new(0),
        }
    }

    /// Session settings.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Return the live interpreter for `key`, starting one if needed.
    ///
    /// A process that exited on its own is replaced. If the spawn fails the
    /// key stays unregistered.
    pub async fn get_or_create(&self, key: &SessionKey) -> Result<Arc<InterpreterProcess>> {
        let mut sessions = self.sessions.lock().await;

        if let Some(process) = sessions.get(key) {
            if process.is_alive().await {
                process.touch();
                return Ok(process.clone());
            }
            info!(session = %key, pid = ?process.pid(), "Interpreter exited, replacing session");
            if let Some(dead) = sessions.remove(key) {
                if let Err(e) = dead.kill().await {
                    debug!(session = %key, error = %e, "Failed to reap exited interpreter");
                }
            }
        }

        if self.config.max_sessions > 0 && sessions.len() >= self.config.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, p)| p.last_activity())
                .map(|(k, _)| k.clone());
            if let Some(old_key) = oldest {
                if let Some(old) = sessions.remove(&old_key) {
                    if let Err(e) = old.kill().await {
                        warn!(session = %old_key, error = %e, "Failed to kill evicted interpreter");
                    }
                    warn!(session = %old_key, "Evicted least recently used session to make room");
                }
            }
        }

        let process = InterpreterProcess::spawn(&self.command, &self.config.pipe_settings())
            .map_err(|source| Error::SessionCreate {
                key: key.clone(),
                source,
            })?;
        self.spawned.fetch_add(1, Ordering::Relaxed);
        info!(session = %key, pid = ?process.pid(), "Started interpreter session");

        let process = Arc::new(process);
        sessions.insert(key.clone(), process.clone());
        Ok(process)
    }

    /// Send one line of input to the session's interpreter.
    ///
    /// A trailing newline is added only when `line` lacks one.
    pub async fn submit_line(&self, key: &SessionKey, line: &str) -> Result<()> {
        let process = self.get_or_create(key).await?;
        process
            .write_line(line)
            .await
            .map_err(|source| Error::Input {
                key: key.clone(),
                source,
            })
    }

    /// Drain whatever the session's interpreter has printed.
    pub async fn poll_output(&self, key: &SessionKey) -> Result<SessionOutput> {
        let process = self.get_or_create(key).await?;
        let (stdout, stderr) = process.read_output().await;
        Ok(SessionOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    /// Kill and forget the session. Returns whether one existed.
    pub async fn reset(&self, key: &SessionKey) -> bool {
        let mut sessions = self.sessions.lock().await;
        let Some(process) = sessions.remove(key) else {
            return false;
        };
        if let Err(e) = process.kill().await {
            warn!(session = %key, error = %e, "Failed to kill interpreter on reset");
        }
        info!(session = %key, "Session reset");
        true
    }

    /// Evict and kill every session idle longer than `idle_timeout`.
    ///
    /// Returns the number of sessions evicted.
    pub async fn reap_idle(&self, idle_timeout: Duration) -> usize {
        let stale: Vec<(SessionKey, Arc<InterpreterProcess>)> = {
            let mut sessions = self.sessions.lock().await;
            let stale_keys: Vec<SessionKey> = sessions
                .iter()
                .filter(|(_, p)| p.idle_for() > idle_timeout)
                .map(|(k, _)| k.clone())
                .collect();
            stale_keys
                .into_iter()
                .filter_map(|k| sessions.remove(&k).map(|p| (k, p)))
                .collect()
        };

        let count = stale.len();
        for (key, process) in stale {
            match process.kill().await {
                Ok(()) => info!(session = %key, "Cleaned up idle interpreter session"),
                Err(e) => warn!(session = %key, error = %e, "Failed to kill idle interpreter"),
            }
        }
        count
    }

    /// Whether `key` is currently registered.
    pub async fn contains(&self, key: &SessionKey) -> bool {
        self.sessions.lock().await.contains_key(key)
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Whether no sessions are registered.
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Table counters.
    pub async fn stats(&self) -> SessionStats {
        SessionStats {
            active: self.len().await,
            spawned_total: self.spawned.load(Ordering::Relaxed),
        }
    }

    /// Kill every session. Used on server shutdown.
    pub async fn shutdown_all(&self) -> usize {
        let drained: Vec<(SessionKey, Arc<InterpreterProcess>)> =
            self.sessions.lock().await.drain().collect();
        let count = drained.len();

        let kills = drained.into_iter().map(|(key, process)| async move {
            if let Err(e) = process.kill().await {
                warn!(session = %key, error = %e, "Failed to kill interpreter on shutdown");
            }
        });
        futures::future::join_all(kills).await;

        if count > 0 {
            info!(count, "Stopped all interpreter sessions");
        }
        count
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("command", &self.command)
            .field("config", &self.config)
            .field("spawned", &self.spawned.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
