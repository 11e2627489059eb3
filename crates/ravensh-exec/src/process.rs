//! Live interpreter process handle

use crate::command::InterpreterCommand;
use crate::error::{Error, Result};
use crate::pipe_reader::BoundedPipeReader;
use std::sync::{Mutex as StdMutex, PoisonError};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Reader settings for a process's output streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipeSettings {
    /// Quiescence window for stdout
    pub stdout_window: Duration,
    /// Quiescence window for stderr
    pub stderr_window: Duration,
    /// Per-stream buffer capacity in bytes
    pub buffer_bytes: usize,
}

impl Default for PipeSettings {
    fn default() -> Self {
        Self {
            stdout_window: Duration::from_millis(250),
            stderr_window: Duration::from_millis(50),
            buffer_bytes: 2048,
        }
    }
}

/// One spawned interpreter and its standard streams.
///
/// Stdin and each output reader have their own lock, so a write never waits
/// behind a poll on the same process.
#[derive(Debug)]
pub struct InterpreterProcess {
    pid: Option<u32>,
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    stdout: BoundedPipeReader,
    stderr: BoundedPipeReader,
    last_activity: StdMutex<Instant>,
}

impl InterpreterProcess {
    /// Start the interpreter.
    ///
    /// On failure nothing is left running: a partially set up child is
    /// killed when dropped.
    pub fn spawn(command: &InterpreterCommand, settings: &PipeSettings) -> Result<Self> {
        let mut child = command
            .build(std::iter::empty::<&str>())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: command.program.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(Error::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(Error::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(Error::MissingPipe("stderr"))?;

        let pid = child.id();
        debug!(pid = ?pid, command = %command, "Spawned interpreter");

        Ok(Self {
            pid,
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            stdout: BoundedPipeReader::new(stdout, settings.stdout_window, settings.buffer_bytes),
            stderr: BoundedPipeReader::new(stderr, settings.stderr_window, settings.buffer_bytes),
            last_activity: StdMutex::new(Instant::now()),
        })
    }

    /// OS process id, if the process had one at spawn time.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Write `line` followed by exactly one newline.
    pub async fn write_line(&self, line: &str) -> Result<()> {
        let mut stdin = self.stdin.lock().await;
        stdin
            .write_all(line.as_bytes())
            .await
            .map_err(Error::StdinWrite)?;
        if !line.ends_with('\n') {
            stdin.write_all(b"\n").await.map_err(Error::StdinWrite)?;
        }
        stdin.flush().await.map_err(Error::StdinWrite)?;
        drop(stdin);

        self.touch();
        Ok(())
    }

    /// Drain stdout and stderr once each, concurrently.
    pub async fn read_output(&self) -> (Vec<u8>, Vec<u8>) {
        let output = tokio::join!(self.stdout.read(), self.stderr.read());
        self.touch();
        output
    }

    /// Non-blocking liveness check.
    pub async fn is_alive(&self) -> bool {
        let mut child = self.child.lock().await;
        matches!(child.try_wait(), Ok(None))
    }

    /// Record activity now.
    pub fn touch(&self) {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    /// Time of the last recorded activity.
    pub fn last_activity(&self) -> Instant {
        *self
            .last_activity
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// How long the process has been idle.
    pub fn idle_for(&self) -> Duration {
        self.last_activity().elapsed()
    }

    /// Forcefully terminate and reap the process.
    ///
    /// Killing a process that already exited is not an error.
    pub async fn kill(&self) -> Result<()> {
        let mut child = self.child.lock().await;
        if child.try_wait()?.is_some() {
            return Ok(());
        }
        child.kill().await?;
        Ok(())
    }
}
