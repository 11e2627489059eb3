//! Server module
//!
//! Configuration loading and the HTTP server lifecycle.

mod config;
mod init;
mod loader;

pub use config::{AppConfig, LoggingConfig};
pub use init::{build_runner, run};

#[cfg(test)]
pub use init::build_router;
pub use loader::load_config;
