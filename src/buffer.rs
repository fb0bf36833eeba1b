//! Growable, patchable byte store holding transcoded output.
//!
//! Encoded audio is produced strictly in order, but two pieces of metadata have
//! to land at offsets that are only known once encoding completes: a trailer
//! anchored to the very end of the file, and a summary header patched in just
//! after the leading tag. [`TranscodeBuffer`] keeps three things apart:
//!
//! - committed bytes, grown by [`append`](TranscodeBuffer::append) and patched in
//!   place by [`write_at`](TranscodeBuffer::write_at)
//! - end-anchored writes queued by [`write_from_end`](TranscodeBuffer::write_from_end)
//! - the final length, committed by [`set_final_length`](TranscodeBuffer::set_final_length),
//!   which is the single point where end-anchored writes are resolved
//!
//! The buffer never blocks. Sharing it between a producer and several readers is
//! the job of [`TranscodeSession`](crate::session::TranscodeSession), which wraps it
//! in a reader/writer lock.

use std::collections::TryReserveError;

use thiserror::Error;

/// Errors raised by [`TranscodeBuffer`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("Write of {len} bytes at offset {offset} exceeds buffer length {limit}")]
    OutOfRange { offset: usize, len: usize, limit: usize },

    #[error("End-anchored write of {len} bytes at distance {distance} does not fit final length {final_len}")]
    AnchorOutOfRange {
        len: usize,
        distance: usize,
        final_len: usize,
    },

    #[error("Buffer has been sealed at its final length; it cannot grow")]
    Sealed,

    #[error("Failed to grow buffer: {0}")]
    Allocation(#[from] TryReserveError),
}

impl BufferError {
    pub const fn out_of_range(offset: usize, len: usize, limit: usize) -> Self {
        BufferError::OutOfRange { offset, len, limit }
    }
}

/// A write whose position is relative to the not-yet-known end of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AnchoredWrite {
    bytes: Vec<u8>,
    /// Number of bytes that follow this write once the final length is known
    distance: usize,
}

impl AnchoredWrite {
    /// Absolute offset of the write for a given final length.
    fn resolve(&self, final_len: usize) -> Result<usize, BufferError> {
        final_len
            .checked_sub(self.distance)
            .and_then(|end| end.checked_sub(self.bytes.len()))
            .ok_or(BufferError::AnchorOutOfRange {
                len: self.bytes.len(),
                distance: self.distance,
                final_len,
            })
    }
}

/// Output byte store supporting forward appends, in-place patches, and writes
/// anchored to the end of the file.
#[derive(Debug, Default, Clone)]
pub struct TranscodeBuffer {
    data: Vec<u8>,
    /// Most bytes the buffer has ever held
    high_water: usize,
    anchored: Vec<AnchoredWrite>,
    predicted_len: Option<usize>,
    final_len: Option<usize>,
}

impl TranscodeBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        TranscodeBuffer {
            data: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Append bytes at the current end of the committed data.
    ///
    /// Fails with [`BufferError::Sealed`] once a final length has been committed
    /// and with [`BufferError::Allocation`] if memory cannot be reserved.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        if self.final_len.is_some() {
            return Err(BufferError::Sealed);
        }
        self.data.try_reserve(bytes.len())?;
        self.data.extend_from_slice(bytes);
        self.high_water = self.high_water.max(self.data.len());
        Ok(())
    }

    /// Overwrite bytes already within `[0, len)`.
    ///
    /// This is strictly a patch: any byte of the range at or beyond the current
    /// length is an [`BufferError::OutOfRange`] and nothing is written.
    pub fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), BufferError> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| BufferError::out_of_range(offset, bytes.len(), self.data.len()))?;
        self.data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    /// Record a write that ends `distance` bytes before the final end of file.
    ///
    /// The write lands at `final_len - distance - bytes.len()`. If the final
    /// length is already committed it is applied immediately, otherwise it is
    /// queued until [`set_final_length`](Self::set_final_length).
    pub fn write_from_end(&mut self, bytes: &[u8], distance: usize) -> Result<(), BufferError> {
        let write = AnchoredWrite {
            bytes: bytes.to_vec(),
            distance,
        };
        if let Some(final_len) = self.final_len {
            let offset = write.resolve(final_len)?;
            self.write_at(offset, &write.bytes)?;
        }
        self.anchored.push(write);
        Ok(())
    }

    /// Commit the final length of the output.
    ///
    /// The committed data is truncated or zero-extended to exactly `final_len`
    /// bytes, then every end-anchored write is applied in the order it was
    /// queued. Calling this again with a different value re-sizes and re-applies
    /// the anchored writes against the new end; the last call wins.
    pub fn set_final_length(&mut self, final_len: usize) -> Result<(), BufferError> {
        // Anchors resolve against the number alone; a failure leaves the buffer untouched.
        let offsets = self
            .anchored
            .iter()
            .map(|write| write.resolve(final_len))
            .collect::<Result<Vec<_>, _>>()?;
        if final_len > self.data.len() {
            self.data.try_reserve(final_len - self.data.len())?;
        }

        self.data.resize(final_len, 0);
        self.high_water = self.high_water.max(final_len);
        self.final_len = Some(final_len);
        for (write, offset) in self.anchored.iter().zip(offsets) {
            self.data[offset..offset + write.bytes.len()].copy_from_slice(&write.bytes);
        }
        Ok(())
    }

    /// Record the size advertised for the output before it is complete.
    pub fn set_predicted_length(&mut self, predicted: usize) {
        self.predicted_len = Some(predicted);
    }

    /// Read up to `length` bytes starting at `offset`, clipped to the bytes
    /// produced so far. Offsets at or beyond the current length yield nothing.
    pub fn read_at(&self, offset: usize, length: usize) -> &[u8] {
        if offset >= self.data.len() {
            return &[];
        }
        let end = offset.saturating_add(length).min(self.data.len());
        &self.data[offset..end]
    }

    /// Number of bytes currently held.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Most bytes the buffer has ever held, including bytes later truncated.
    pub const fn high_water_mark(&self) -> usize {
        self.high_water
    }

    pub const fn predicted_length(&self) -> Option<usize> {
        self.predicted_len
    }

    pub const fn final_length(&self) -> Option<usize> {
        self.final_len
    }

    /// Whether the final length has been committed.
    pub const fn is_sealed(&self) -> bool {
        self.final_len.is_some()
    }

    /// Number of end-anchored writes recorded so far.
    pub fn pending_anchored_writes(&self) -> usize {
        if self.final_len.is_some() {
            0
        } else {
            self.anchored.len()
        }
    }

    /// Size to report for the output: the final length once committed, else the
    /// prediction, else whatever has been produced.
    pub fn reported_size(&self) -> usize {
        self.final_len
            .or(self.predicted_len)
            .unwrap_or(self.data.len())
    }

    /// All bytes currently held.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
