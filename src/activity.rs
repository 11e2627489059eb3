//! Client activity records
//!
//! One `info` event per client action under the [`ACTIVITY_TARGET`] target.
//! The telemetry layer routes these to the activity log file when enabled.

use crate::middleware::ClientSession;
use ravensh_core::SessionOutput;
use ravensh_exec::ExecutionResult;
use tracing::info;

/// Tracing target for activity records.
pub const ACTIVITY_TARGET: &str = "ravensh::activity";

fn client_addr(client: &ClientSession) -> String {
    client
        .addr
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// A new session key was issued.
pub fn connect(client: &ClientSession) {
    info!(
        target: ACTIVITY_TARGET,
        action = "connect",
        client = %client_addr(client),
        session = %client.key,
        "Client connected"
    );
}

pub fn line_submitted(client: &ClientSession, line: &str) {
    info!(
        target: ACTIVITY_TARGET,
        action = "line",
        client = %client_addr(client),
        session = %client.key,
        line,
        "Line submitted"
    );
}

pub fn output_polled(client: &ClientSession, output: &SessionOutput) {
    if output.is_empty() {
        return;
    }
    info!(
        target: ACTIVITY_TARGET,
        action = "poll",
        client = %client_addr(client),
        session = %client.key,
        stdout_bytes = output.stdout.len(),
        stderr_bytes = output.stderr.len(),
        "Output polled"
    );
}

pub fn program_executed(client: &ClientSession, result: &ExecutionResult) {
    info!(
        target: ACTIVITY_TARGET,
        action = "program",
        client = %client_addr(client),
        session = %client.key,
        status = %result.status,
        exit_code = ?result.exit_code,
        duration_ms = result.duration_ms,
        "Program executed"
    );
}

pub fn session_reset(client: &ClientSession, existed: bool) {
    info!(
        target: ACTIVITY_TARGET,
        action = "reset",
        client = %client_addr(client),
        session = %client.key,
        existed,
        "Session reset"
    );
}
