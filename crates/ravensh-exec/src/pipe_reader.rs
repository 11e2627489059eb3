//! Bounded pipe reader
//!
//! Wraps a byte stream so that a read returns whatever output is pending,
//! waiting only while the stream keeps producing. A background pump task
//! moves bytes from the pipe into a bounded buffer and records when the
//! last byte arrived. [`BoundedPipeReader::read`] then:
//!
//! - returns an empty buffer immediately when nothing is pending
//! - otherwise waits until no new byte has arrived for the quiescence
//!   window, the stream closes, or the buffer fills, and returns everything
//!
//! While the buffer is full the pump stops pulling from the pipe, so a
//! chatty process blocks on its own write instead of growing our memory.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

/// Largest single read issued against the pipe.
const CHUNK_SIZE: usize = 4096;

struct PipeState {
    buf: Vec<u8>,
    last_arrival: Option<Instant>,
    closed: bool,
}

struct Shared {
    state: Mutex<PipeState>,
    capacity: usize,
    /// Signalled when bytes arrive or the stream closes
    data: Notify,
    /// Signalled when a read frees buffer space
    space: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Quiescence-bounded reader over a child process pipe.
pub struct BoundedPipeReader {
    shared: Arc<Shared>,
    window: Duration,
    read_lock: tokio::sync::Mutex<()>,
    pump: JoinHandle<()>,
}

impl BoundedPipeReader {
    /// Start pumping `reader` into a buffer of at most `capacity` bytes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<R>(reader: R, window: Duration, capacity: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let shared = Arc::new(Shared {
            state: Mutex::new(PipeState {
                buf: Vec::with_capacity(capacity.min(CHUNK_SIZE)),
                last_arrival: None,
                closed: false,
            }),
            capacity: capacity.max(1),
            data: Notify::new(),
            space: Notify::new(),
        });

        let pump = tokio::spawn(pump(reader, shared.clone()));

        Self {
            shared,
            window,
            read_lock: tokio::sync::Mutex::new(()),
            pump,
        }
    }

    /// Whether the underlying stream has reached end-of-stream.
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    /// Number of bytes currently buffered.
    pub fn pending(&self) -> usize {
        self.shared.lock().buf.len()
    }

    /// Take pending output.
    ///
    /// Concurrent callers are serialized; each byte is returned exactly once.
    pub async fn read(&self) -> Vec<u8> {
        let _guard = self.read_lock.lock().await;

        loop {
            let notified = self.shared.data.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let deadline = {
                let mut state = self.shared.lock();
                if state.buf.is_empty() {
                    return Vec::new();
                }
                if state.closed || state.buf.len() >= self.shared.capacity {
                    return self.take(&mut state);
                }
                let last = state.last_arrival.unwrap_or_else(Instant::now);
                let deadline = last + self.window;
                if Instant::now() >= deadline {
                    return self.take(&mut state);
                }
                deadline
            };

            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep_until(deadline) => {}
            }
        }
    }

    fn take(&self, state: &mut PipeState) -> Vec<u8> {
        let out = std::mem::take(&mut state.buf);
        self.shared.space.notify_waiters();
        out
    }
}

impl Drop for BoundedPipeReader {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

impl std::fmt::Debug for BoundedPipeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedPipeReader")
            .field("window", &self.window)
            .field("capacity", &self.shared.capacity)
            .field("pending", &self.pending())
            .finish()
    }
}

async fn pump<R>(mut reader: R, shared: Arc<Shared>)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; CHUNK_SIZE];

    loop {
        let room = loop {
            let notified = shared.space.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            let free = shared.capacity.saturating_sub(shared.lock().buf.len());
            if free > 0 {
                break free;
            }
            notified.await;
        };

        let want = room.min(CHUNK_SIZE);
        match reader.read(&mut chunk[..want]).await {
            Ok(0) => break,
            Ok(n) => {
                {
                    let mut state = shared.lock();
                    state.buf.extend_from_slice(&chunk[..n]);
                    state.last_arrival = Some(Instant::now());
                }
                shared.data.notify_waiters();
            }
            Err(e) => {
                debug!(error = %e, "Pipe read failed, treating as end of stream");
                break;
            }
        }
    }

    shared.lock().closed = true;
    shared.data.notify_waiters();
}
