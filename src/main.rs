//! ravensh - Interpreter Sessions over HTTP
//!
//! CLI entry point for the ravensh server.

#![forbid(unsafe_code)]

use anyhow::Result;
use clap::Parser;
use tracing::info;

mod activity;
mod api;
mod cli;
mod middleware;
mod server;
mod telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();

    let config = server::load_config();
    let _log_guard = telemetry::init(config.as_ref().ok().map(|c| &c.logging));
    let config = config?;

    if cli.command.is_some() {
        info!("Starting ravensh v{}", env!("CARGO_PKG_VERSION"));
    }

    cli::run(cli, config).await
}
