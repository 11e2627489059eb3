//! Configuration loading
//!
//! Handles loading configuration from embedded defaults, files, and environment.

use super::config::AppConfig;
use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat};

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Selects the `config/<name>` overlay file.
const ENV_VAR: &str = "RAVENSH_ENV";

/// Keys parsed from comma-separated environment values.
const LIST_KEYS: &[&str] = &["server.allowed_origins", "interpreter.args"];

/// Load configuration from files and environment
pub fn load_config() -> Result<AppConfig> {
    let profile = std::env::var(ENV_VAR).unwrap_or_else(|_| "development".to_string());
    let config: AppConfig = layered(&profile)
        .add_source(env_source())
        .build()
        .context("Failed to build configuration")?
        .try_deserialize()
        .context("Failed to deserialize configuration")?;

    config.validate()?;
    Ok(config)
}

/// Embedded defaults overlaid by the optional files for `profile`.
fn layered(profile: &str) -> ConfigBuilder<DefaultState> {
    let overlays = [
        "config/default".to_string(),
        format!("config/{profile}"),
        "config/local".to_string(),
    ];

    overlays.iter().fold(
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml)),
        |builder, name| builder.add_source(File::with_name(name).required(false)),
    )
}

/// `RAVENSH_<SECTION>__<KEY>` variables, e.g. `RAVENSH_SERVER__PORT`.
fn env_source() -> Environment {
    LIST_KEYS.iter().fold(
        Environment::with_prefix("RAVENSH")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .try_parsing(true),
        |env, key| env.with_list_parse_key(key),
    )
}
