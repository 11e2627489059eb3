//! One-shot execution limits

use std::time::Duration;

/// Default wall-clock deadline.
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

/// Default per-stream output cap.
pub const DEFAULT_OUTPUT_LIMIT_BYTES: usize = 64 * 1024;

/// Limits applied to every one-shot execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionLimits {
    /// Deadline measured from spawn.
    pub timeout: Duration,
    /// Maximum captured stdout bytes.
    pub stdout_limit_bytes: usize,
    /// Maximum captured stderr bytes.
    pub stderr_limit_bytes: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            stdout_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
            stderr_limit_bytes: DEFAULT_OUTPUT_LIMIT_BYTES,
        }
    }
}
