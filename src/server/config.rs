//! Server configuration types
//!
//! Contains all configuration structures for the ravensh server.

use anyhow::{bail, Context, Result};
use axum::http::HeaderValue;
use ravensh_core::SessionConfig;
use ravensh_exec::{ExecutionLimits, InterpreterCommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub interpreter: InterpreterConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        self.session
            .validate()
            .context("Invalid [session] configuration")?;

        if self.interpreter.program.trim().is_empty() {
            bail!("interpreter.program must not be empty");
        }
        if self.execution.timeout_ms == 0 {
            bail!("execution.timeout_ms must be non-zero");
        }
        if self.execution.stdout_limit_bytes == 0 || self.execution.stderr_limit_bytes == 0 {
            bail!("execution output limits must be non-zero");
        }
        if self.server.cookie_name.is_empty()
            || !self
                .server
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!(
                "server.cookie_name must be non-empty and contain only [A-Za-z0-9_-]: {:?}",
                self.server.cookie_name
            );
        }
        for origin in &self.server.allowed_origins {
            if origin.trim() == "*" {
                bail!(
                    "server.allowed_origins cannot contain \"*\" because credentials are allowed; \
                     use an empty list to mirror the request origin"
                );
            }
            HeaderValue::from_str(origin)
                .with_context(|| format!("Invalid CORS origin: {}", origin))?;
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origins allowed to call the API with credentials. Empty mirrors the
    /// request origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Upper bound on a single request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Cookie carrying the client session key
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_cookie_max_age_secs")]
    pub cookie_max_age_secs: u64,
    /// Mark the cookie `SameSite=None; Secure` for cross-site front ends
    #[serde(default)]
    pub cookie_cross_site: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:8080".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_cookie_name() -> String {
    "ravensh_session".to_string()
}

fn default_cookie_max_age_secs() -> u64 {
    3600
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origins: default_allowed_origins(),
            request_timeout_secs: default_request_timeout_secs(),
            cookie_name: default_cookie_name(),
            cookie_max_age_secs: default_cookie_max_age_secs(),
            cookie_cross_site: false,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// External interpreter launched for sessions and programs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpreterConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_program_args")]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

fn default_program() -> String {
    "java".to_string()
}

fn default_program_args() -> Vec<String> {
    vec!["-jar".to_string(), "raven.jar".to_string()]
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_program_args(),
            working_dir: None,
        }
    }
}

impl InterpreterConfig {
    pub fn command(&self) -> InterpreterCommand {
        InterpreterCommand {
            program: self.program.clone(),
            args: self.args.clone(),
            working_dir: self.working_dir.clone(),
        }
    }
}

/// One-shot execution limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_output_limit")]
    pub stdout_limit_bytes: usize,
    #[serde(default = "default_output_limit")]
    pub stderr_limit_bytes: usize,
    /// Where program sources are written; system temp dir when unset
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_output_limit() -> usize {
    64 * 1024
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            stdout_limit_bytes: default_output_limit(),
            stderr_limit_bytes: default_output_limit(),
            scratch_dir: None,
        }
    }
}

impl ExecutionConfig {
    pub fn limits(&self) -> ExecutionLimits {
        ExecutionLimits {
            timeout: Duration::from_millis(self.timeout_ms),
            stdout_limit_bytes: self.stdout_limit_bytes,
            stderr_limit_bytes: self.stderr_limit_bytes,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the daily activity log; disabled when unset
    #[serde(default)]
    pub activity_dir: Option<PathBuf>,
    #[serde(default = "default_activity_file_prefix")]
    pub activity_file_prefix: String,
}

fn default_activity_file_prefix() -> String {
    "activity.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            activity_dir: None,
            activity_file_prefix: default_activity_file_prefix(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.interpreter.command().to_string(), "java -jar raven.jar");
        assert_eq!(config.execution.limits(), ExecutionLimits::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.interpreter.program = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.execution.timeout_ms = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.cookie_name = "bad cookie".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.allowed_origins = vec!["http://bad\norigin".to_string()];
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.server.allowed_origins = vec!["http://localhost:8080".to_string(), "*".to_string()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("empty list"));

        let mut config = AppConfig::default();
        config.server.allowed_origins.clear();
        assert!(config.validate().is_ok());

        let mut config = AppConfig::default();
        config.session.read_buffer_bytes = 0;
        assert!(config.validate().is_err());
    }
}
