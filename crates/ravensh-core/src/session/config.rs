//! Session configuration types

use crate::error::{Error, Result};
use ravensh_exec::PipeSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Interactive session settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Quiescence window for interpreter stdout, in milliseconds.
    #[serde(default = "default_stdout_quiescence_ms")]
    pub stdout_quiescence_ms: u64,
    /// Quiescence window for interpreter stderr, in milliseconds.
    #[serde(default = "default_stderr_quiescence_ms")]
    pub stderr_quiescence_ms: u64,
    /// Bytes buffered per stream between polls.
    #[serde(default = "default_read_buffer_bytes")]
    pub read_buffer_bytes: usize,
    /// Sessions idle longer than this are reaped.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// How often the reaper runs.
    #[serde(default = "default_reap_interval_secs")]
    pub reap_interval_secs: u64,
    /// Maximum live sessions; the least recently used one is evicted
    /// to make room. Zero disables the limit.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_stdout_quiescence_ms() -> u64 {
    250
}

fn default_stderr_quiescence_ms() -> u64 {
    50
}

fn default_read_buffer_bytes() -> usize {
    2048
}

fn default_idle_timeout_secs() -> u64 {
    20 * 60
}

fn default_reap_interval_secs() -> u64 {
    10
}

fn default_max_sessions() -> usize {
    256
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stdout_quiescence_ms: default_stdout_quiescence_ms(),
            stderr_quiescence_ms: default_stderr_quiescence_ms(),
            read_buffer_bytes: default_read_buffer_bytes(),
            idle_timeout_secs: default_idle_timeout_secs(),
            reap_interval_secs: default_reap_interval_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

impl SessionConfig {
    /// Reject values that would make sessions unusable.
    pub fn validate(&self) -> Result<()> {
        if self.stdout_quiescence_ms == 0 || self.stderr_quiescence_ms == 0 {
            return Err(Error::InvalidConfig(
                "quiescence windows must be non-zero".to_string(),
            ));
        }
        if self.read_buffer_bytes == 0 {
            return Err(Error::InvalidConfig(
                "read_buffer_bytes must be non-zero".to_string(),
            ));
        }
        if self.idle_timeout_secs == 0 || self.reap_interval_secs == 0 {
            return Err(Error::InvalidConfig(
                "idle_timeout_secs and reap_interval_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Reader settings for each spawned interpreter.
    pub fn pipe_settings(&self) -> PipeSettings {
        PipeSettings {
            stdout_window: Duration::from_millis(self.stdout_quiescence_ms),
            stderr_window: Duration::from_millis(self.stderr_quiescence_ms),
            buffer_bytes: self.read_buffer_bytes,
        }
    }

    /// Idle threshold.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Reaper period.
    pub fn reap_interval(&self) -> Duration {
        Duration::from_secs(self.reap_interval_secs)
    }
}
