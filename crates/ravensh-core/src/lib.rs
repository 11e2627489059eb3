//! Ravensh Core - Interactive Session Engine
//!
//! This crate keeps one interpreter process per client session:
//! - Session: keyed table of live interpreters with create-on-miss
//! - Reaper: periodic eviction of idle sessions
//! - Shutdown: cancellation shared by background tasks

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod reaper;
pub mod session;
pub mod shutdown;

pub use error::{Error, Result};
pub use reaper::spawn_reaper;
pub use session::{SessionConfig, SessionKey, SessionManager, SessionOutput, SessionStats};
pub use shutdown::{shutdown_signal_with_controller, wait_for_shutdown_signal, ShutdownController};
