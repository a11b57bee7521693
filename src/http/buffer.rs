//! Growable byte region backing one in-flight request.

use std::collections::TryReserveError;

use serde::Deserialize;

/// Growth and size policy for a [`RequestBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BufferLimits {
    /// Bytes added each time the buffer runs out of room.
    pub block_size: usize,
    /// Size at which the buffer is forced complete. `None` means unbounded.
    pub max_size: Option<usize>,
}

impl Default for BufferLimits {
    fn default() -> Self {
        Self {
            block_size: 1000,
            max_size: Some(10 * 1000),
        }
    }
}

/// Append-only request storage.
///
/// `data.len()` is the capacity; `used` counts the bytes actually received.
/// The capacity only grows, in `block_size` steps, until [`reset`](Self::reset)
/// releases the whole region.
#[derive(Debug)]
pub struct RequestBuffer {
    data: Vec<u8>,
    used: usize,
    complete: bool,
    limits: BufferLimits,
}

impl RequestBuffer {
    pub fn new(limits: BufferLimits) -> Self {
        Self {
            data: Vec::new(),
            used: 0,
            complete: false,
            limits,
        }
    }

    /// Received bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.used]
    }

    pub fn len(&self) -> usize {
        self.used
    }

    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Returns the unused tail of the buffer, adding one block first when the
    /// buffer is full.
    pub fn spare_mut(&mut self) -> Result<&mut [u8], TryReserveError> {
        if self.used == self.data.len() {
            self.grow()?;
        }
        Ok(&mut self.data[self.used..])
    }

    /// Marks `n` bytes of the spare region as received.
    pub fn commit(&mut self, n: usize) {
        assert!(
            self.used + n <= self.data.len(),
            "commit past buffer capacity"
        );
        self.used += n;
    }

    /// Copies `bytes` to the end of the buffer, growing block by block.
    pub fn append(&mut self, mut bytes: &[u8]) -> Result<(), TryReserveError> {
        while !bytes.is_empty() {
            let spare = self.spare_mut()?;
            let n = spare.len().min(bytes.len());
            spare[..n].copy_from_slice(&bytes[..n]);
            self.commit(n);
            bytes = &bytes[n..];
        }
        Ok(())
    }

    fn grow(&mut self) -> Result<(), TryReserveError> {
        let block = self.limits.block_size.max(1);
        self.data.try_reserve_exact(block)?;
        self.data.resize(self.data.len() + block, 0);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn mark_complete(&mut self) {
        self.complete = true;
    }

    pub fn clear_complete(&mut self) {
        self.complete = false;
    }

    /// Whether the configured maximum size has been reached.
    pub fn at_limit(&self) -> bool {
        self.limits.max_size.is_some_and(|max| self.used >= max)
    }

    /// Drops all data and releases the allocation.
    pub fn reset(&mut self) {
        self.data = Vec::new();
        self.used = 0;
        self.complete = false;
    }
}
