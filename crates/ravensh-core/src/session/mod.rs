//! Interactive interpreter sessions
//!
//! A session binds an opaque client key to one long-running interpreter.
//! Clients type into it line by line and poll for whatever it printed.

mod config;
mod manager;

#[cfg(all(test, unix))]
mod tests;

pub use config::SessionConfig;
pub use manager::SessionManager;

use serde::{Deserialize, Serialize};

/// Opaque client session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Wrap an existing identifier.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Mint a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output drained from a session by one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOutput {
    /// Pending stdout
    pub stdout: String,
    /// Pending stderr
    pub stderr: String,
}

impl SessionOutput {
    /// Whether the poll produced nothing.
    pub fn is_empty(&self) -> bool {
        self.stdout.is_empty() && self.stderr.is_empty()
    }
}

/// Session table counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Sessions currently in the table
    pub active: usize,
    /// Interpreters spawned since startup
    pub spawned_total: u64,
}
