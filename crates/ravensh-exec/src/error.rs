//! Error types for ravensh-exec

use thiserror::Error;

/// Process error type
#[derive(Debug, Error)]
pub enum Error {
    /// The interpreter could not be started
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that was being started
        program: String,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// A standard stream was not piped after spawn
    #[error("child process has no {0} pipe")]
    MissingPipe(&'static str),

    /// Writing the program source to disk failed
    #[error("failed to write program source: {0}")]
    SourceFile(#[source] std::io::Error),

    /// Writing to the interpreter's stdin failed
    #[error("failed to write to interpreter stdin: {0}")]
    StdinWrite(#[source] std::io::Error),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
