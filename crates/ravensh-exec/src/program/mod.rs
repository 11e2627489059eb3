//! One-shot program execution
//!
//! Runs a program text against a fresh interpreter process that is never
//! registered anywhere, under one wall-clock deadline and per-stream output
//! caps. The process is always gone by the time [`ProgramRunner::execute`]
//! returns.

mod capture;
mod config;
mod runner;


pub use capture::CappedBuffer;
pub use config::ExecutionLimits;
pub use runner::ProgramRunner;

use serde::{Deserialize, Serialize};

/// Program submitted for one-shot execution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramRequest {
    /// Program source text
    pub src: String,
    /// Raw argument string, tokenized with [`crate::split_args`]
    #[serde(default)]
    pub args: String,
    /// Text fed to the program's stdin
    #[serde(default)]
    pub stdin: String,
}

/// How a one-shot execution ended.
///
/// Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ExecutionStatus {
    /// Process exited and both streams closed before the deadline
    Ok = 0,
    /// Deadline passed first; the process was killed
    Timeout = 1,
    /// A stream produced more than its cap; output was truncated
    Overflow = 2,
}

impl From<ExecutionStatus> for u8 {
    fn from(status: ExecutionStatus) -> Self {
        status as u8
    }
}

impl TryFrom<u8> for ExecutionStatus {
    type Error = String;

    fn try_from(code: u8) -> std::result::Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Ok),
            1 => Ok(Self::Timeout),
            2 => Ok(Self::Overflow),
            other => Err(format!("unknown execution status: {}", other)),
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Timeout => write!(f, "timeout"),
            Self::Overflow => write!(f, "overflow"),
        }
    }
}

/// Outcome of a one-shot execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Completion status
    pub status: ExecutionStatus,
    /// Captured stdout (lossy UTF-8, capped)
    pub stdout: String,
    /// Captured stderr (lossy UTF-8, capped)
    pub stderr: String,
    /// Exit code, absent when the process was killed
    pub exit_code: Option<i32>,
    /// Wall-clock time from spawn to teardown
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Whether the program ran to completion within its limits.
    pub fn is_ok(&self) -> bool {
        self.status == ExecutionStatus::Ok
    }
}
