use core::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::{path::PathBuf, time::SystemTime};

use crate::{
    buffer::{BufferError, TranscodeBuffer},
    error::TranscodeResult,
    types::{MetaTag, PcmBlock, ReplayGain, StreamParams},
};

/// Destination for encoder output.
///
/// Mirrors the mutating half of [`TranscodeBuffer`] so that a sink shared with
/// concurrent readers can take its lock for each write rather than for the
/// whole encode.
pub trait OutputSink {
    /// Append bytes at the current end.
    fn append(&mut self, bytes: &[u8]) -> Result<(), BufferError>;
    /// Patch bytes already written.
    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), BufferError>;
    /// Write bytes ending `distance` bytes before the final end of file.
    fn write_from_end(&mut self, bytes: &[u8], distance: usize) -> Result<(), BufferError>;
    /// Advertise the expected final length.
    fn set_predicted_length(&mut self, predicted: usize);
}

impl OutputSink for TranscodeBuffer {
    fn append(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        TranscodeBuffer::append(self, bytes)
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), BufferError> {
        TranscodeBuffer::write_at(self, offset, bytes)
    }

    fn write_from_end(&mut self, bytes: &[u8], distance: usize) -> Result<(), BufferError> {
        TranscodeBuffer::write_from_end(self, bytes, distance)
    }

    fn set_predicted_length(&mut self, predicted: usize) {
        TranscodeBuffer::set_predicted_length(self, predicted)
    }
}

/// A source of PCM audio and metadata for one file.
///
/// Implementations wrap a format decoder (FLAC, Ogg Vorbis, ...). Blocks are
/// pulled strictly in order by a single producer thread.
pub trait Decoder: Send {
    /// Stream parameters, known once headers have been read.
    fn stream_params(&self) -> StreamParams;

    /// Next block of decoded audio, `None` once the stream is exhausted.
    fn next_pcm_block(&mut self) -> TranscodeResult<Option<PcmBlock>>;

    /// Raw text tags as `(key, value bytes)` pairs. Values are expected to be
    /// UTF-8; anything else is dropped when mapped.
    fn tags(&self) -> Vec<(MetaTag, Vec<u8>)> {
        Vec::new()
    }

    /// Raw embedded picture blocks, still in their binary layout.
    fn pictures(&self) -> Vec<Vec<u8>> {
        Vec::new()
    }

    fn replay_gain(&self) -> ReplayGain {
        ReplayGain::default()
    }
}

/// Identity of a source file for caching: its path and modification time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    pub path: PathBuf,
    pub mtime: SystemTime,
}

impl SourceKey {
    pub fn new(path: impl Into<PathBuf>, mtime: SystemTime) -> Self {
        SourceKey {
            path: path.into(),
            mtime,
        }
    }
}

impl Display for SourceKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.path.display())
    }
}

/// Remembers exact output sizes of completed transcodes.
pub trait SizeCache: Debug + Send + Sync {
    /// Exact size of a previous transcode of this source, if still valid.
    fn lookup(&self, key: &SourceKey) -> Option<u64>;

    /// Record the exact size (and bytes) of a completed transcode.
    fn store(&self, key: &SourceKey, size: u64, bytes: &[u8]);
}
