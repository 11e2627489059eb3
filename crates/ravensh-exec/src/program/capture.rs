//! Capped output capture

/// Byte buffer that keeps at most `capacity` bytes.
///
/// Filling it exactly is not truncation; only bytes beyond the cap are.
#[derive(Debug, Clone)]
pub struct CappedBuffer {
    data: Vec<u8>,
    capacity: usize,
    truncated: bool,
}

impl CappedBuffer {
    /// Create an empty buffer.
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::new(),
            capacity,
            truncated: false,
        }
    }

    /// Append as much of `bytes` as fits.
    ///
    /// Returns `false` once anything had to be dropped.
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        let room = self.capacity.saturating_sub(self.data.len());
        if bytes.len() > room {
            self.data.extend_from_slice(&bytes[..room]);
            self.truncated = true;
        } else {
            self.data.extend_from_slice(bytes);
        }
        !self.truncated
    }

    /// Whether output beyond the cap was dropped.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Captured byte count.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Captured bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Captured bytes as lossy UTF-8.
    pub fn to_string_lossy(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}
