//! CLI module for ravensh
//!
//! Provides commands:
//! - `serve`: Start the HTTP server
//! - `run`: Execute a program file once, like `POST /program`
//! - `doctor`: Check that the configured interpreter starts

use crate::server::AppConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod doctor;
pub mod run;

/// ravensh CLI
#[derive(Parser, Debug)]
#[command(name = "ravensh")]
#[command(about = "Drive an interpreter process over HTTP")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve,
    /// Run a program file with the configured interpreter and limits
    Run {
        /// Program source file
        file: PathBuf,
        /// Argument string, split like a shell would
        #[arg(long, default_value = "")]
        args: String,
        /// File whose contents are fed to the program's stdin
        #[arg(long)]
        stdin: Option<PathBuf>,
    },
    /// Run system diagnostics
    Doctor,
}

/// Run the CLI command
pub async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run(config).await,
        Some(Commands::Run { file, args, stdin }) => {
            run::run(&config, &file, args, stdin.as_deref()).await
        }
        Some(Commands::Doctor) => doctor::run(&config).await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}
