//! Error types for ravensh-core

use crate::session::SessionKey;
use thiserror::Error;

/// Session engine error type
#[derive(Debug, Error)]
pub enum Error {
    /// No interpreter could be started for the session
    #[error("failed to create session {key}: {source}")]
    SessionCreate {
        /// Session that was being created
        key: SessionKey,
        /// Underlying spawn failure
        #[source]
        source: ravensh_exec::Error,
    },

    /// Sending input to the session's interpreter failed
    #[error("failed to send input to session {key}: {source}")]
    Input {
        /// Target session
        key: SessionKey,
        /// Underlying write failure
        #[source]
        source: ravensh_exec::Error,
    },

    /// Rejected configuration value
    #[error("invalid session configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
