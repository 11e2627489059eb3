//! One-shot runner

use super::capture::CappedBuffer;
use super::config::ExecutionLimits;
use super::{ExecutionResult, ExecutionStatus, ProgramRequest};
use crate::args::split_args;
use crate::command::InterpreterCommand;
use crate::error::{Error, Result};
use crate::group;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::ChildStdin;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// How long stream tasks get to wind down after the process is gone.
const DRAIN_GRACE: Duration = Duration::from_millis(200);

const READ_CHUNK: usize = 4096;

type SharedBuffer = Arc<Mutex<CappedBuffer>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DrainEvent {
    Finished,
    Overflow,
}

/// Executes programs in throwaway interpreter processes.
#[derive(Debug, Clone)]
pub struct ProgramRunner {
    command: InterpreterCommand,
    limits: ExecutionLimits,
    scratch_dir: Option<PathBuf>,
}

impl ProgramRunner {
    /// Create a runner for `command`.
    pub fn new(command: InterpreterCommand, limits: ExecutionLimits) -> Self {
        Self {
            command,
            limits,
            scratch_dir: None,
        }
    }

    /// Write program sources under `dir` instead of the system temp dir.
    #[must_use]
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Limits applied to each execution.
    pub fn limits(&self) -> &ExecutionLimits {
        &self.limits
    }

    /// Run `request` to completion, timeout or overflow.
    ///
    /// Only setup failures (source file, spawn) are errors. Timeouts and
    /// overflows are reported through [`ExecutionResult::status`].
    pub async fn execute(&self, request: &ProgramRequest) -> Result<ExecutionResult> {
        let source = self.write_source(&request.src).await?;

        let mut argv: Vec<OsString> = vec![source.path().as_os_str().to_owned()];
        argv.extend(split_args(&request.args).into_iter().map(OsString::from));

        let started = Instant::now();
        let deadline = started + self.limits.timeout;

        let mut cmd = self.command.build(&argv);
        group::isolate(&mut cmd);
        let mut child = cmd.spawn().map_err(|source| Error::Spawn {
            program: self.command.program.clone(),
            source,
        })?;
        let pgid = child.id();

        let stdin = child.stdin.take().ok_or(Error::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(Error::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(Error::MissingPipe("stderr"))?;

        let stdout_buf: SharedBuffer =
            Arc::new(Mutex::new(CappedBuffer::new(self.limits.stdout_limit_bytes)));
        let stderr_buf: SharedBuffer =
            Arc::new(Mutex::new(CappedBuffer::new(self.limits.stderr_limit_bytes)));

        let (done_tx, mut done_rx) = mpsc::channel(2);
        let writer = tokio::spawn(feed_stdin(stdin, request.stdin.clone().into_bytes()));
        let drains = [
            tokio::spawn(drain(stdout, stdout_buf.clone(), done_tx.clone())),
            tokio::spawn(drain(stderr, stderr_buf.clone(), done_tx)),
        ];

        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);

        let mut finished = 0;
        let mut timed_out = false;
        let mut overflowed = false;

        while finished < drains.len() {
            tokio::select! {
                event = done_rx.recv() => match event {
                    Some(DrainEvent::Finished) => finished += 1,
                    Some(DrainEvent::Overflow) => {
                        overflowed = true;
                        break;
                    }
                    None => break,
                },
                _ = &mut sleep => {
                    timed_out = true;
                    break;
                }
            }
        }

        let mut exit_status = None;
        let mut reaped = false;
        if !timed_out && !overflowed {
            tokio::select! {
                status = child.wait() => {
                    reaped = true;
                    exit_status = log_wait(status);
                }
                _ = &mut sleep => timed_out = true,
            }
        }

        if !reaped {
            group::kill_tree(&mut child, pgid);
            exit_status = log_wait(child.wait().await);
        }
        // Leftover background processes die with the program.
        if let Some(pgid) = pgid {
            group::kill_group(pgid);
        }

        for task in drains {
            settle(task).await;
        }
        settle(writer).await;

        let stdout = take_buffer(&stdout_buf);
        let stderr = take_buffer(&stderr_buf);

        let status = if stdout.is_truncated() || stderr.is_truncated() {
            ExecutionStatus::Overflow
        } else if timed_out {
            ExecutionStatus::Timeout
        } else {
            ExecutionStatus::Ok
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            status = %status,
            exit_code = ?exit_status.and_then(|s| s.code()),
            duration_ms,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "Program execution finished"
        );

        Ok(ExecutionResult {
            status,
            stdout: stdout.to_string_lossy(),
            stderr: stderr.to_string_lossy(),
            exit_code: exit_status.and_then(|s| s.code()),
            duration_ms,
        })
    }

    async fn write_source(&self, src: &str) -> Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("ravensh-");

        let file = match self.scratch_dir {
            Some(ref dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(Error::SourceFile)?;

        tokio::fs::write(file.path(), src)
            .await
            .map_err(Error::SourceFile)?;
        Ok(file)
    }
}

async fn feed_stdin(mut stdin: ChildStdin, input: Vec<u8>) {
    if !input.is_empty() {
        if let Err(e) = stdin.write_all(&input).await {
            debug!(error = %e, "Program closed stdin early");
            return;
        }
    }
    if let Err(e) = stdin.shutdown().await {
        debug!(error = %e, "Failed to close program stdin");
    }
}

async fn drain<R>(mut reader: R, sink: SharedBuffer, done: mpsc::Sender<DrainEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK];
    let event = loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break DrainEvent::Finished,
            Ok(n) => {
                let fits = sink
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(&chunk[..n]);
                if !fits {
                    break DrainEvent::Overflow;
                }
            }
            Err(e) => {
                debug!(error = %e, "Program stream read failed");
                break DrainEvent::Finished;
            }
        }
    };
    let _ = done.send(event).await;
}

fn log_wait(status: std::io::Result<ExitStatus>) -> Option<ExitStatus> {
    match status {
        Ok(status) => Some(status),
        Err(e) => {
            warn!(error = %e, "Failed to wait for program exit");
            None
        }
    }
}

/// Wait briefly for a helper task, then abort it.
async fn settle(mut task: JoinHandle<()>) {
    if tokio::time::timeout(DRAIN_GRACE, &mut task).await.is_err() {
        warn!("Stream task still running after process exit, aborting");
        task.abort();
    }
}

fn take_buffer(buf: &SharedBuffer) -> CappedBuffer {
    let mut guard = buf.lock().unwrap_or_else(PoisonError::into_inner);
    let empty = CappedBuffer::new(0);
    std::mem::replace(&mut *guard, empty)
}
