use std::io;

use thiserror::Error;

use crate::buffer::BufferError;
use crate::flac::error::PictureError;
use crate::mp3::error::EncoderError;

/// Result type for audio_transcode_io operations
#[allow(clippy::result_large_err)]
pub type TranscodeResult<T> = Result<T, TranscodeError>;

/// Comprehensive error type for audio_transcode_io operations
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// File I/O errors (source not found, permission denied, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    /// Malformed embedded picture; callers skip the picture and carry on
    #[error("Picture error: {0}")]
    Picture(#[from] PictureError),

    #[error("Decoder error: {0}")]
    Decoder(String),

    /// The producer for a session failed; the output can never be completed
    #[error("Transcoding aborted: {0}")]
    Aborted(String),

    #[error("Transcoding cancelled before completion")]
    Cancelled,
}

impl TranscodeError {
    /// Create a Decoder error with a custom message
    pub fn decoder(message: impl Into<String>) -> Self {
        TranscodeError::Decoder(message.into())
    }

    /// Create an Aborted error with a custom message
    pub fn aborted(message: impl Into<String>) -> Self {
        TranscodeError::Aborted(message.into())
    }

    /// Whether this error ends the owning session.
    ///
    /// Metadata problems are best-effort and only drop the offending item.
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, TranscodeError::Picture(_))
    }

    /// Map onto an [`io::Error`] for the filesystem layer.
    pub fn into_io_error(self) -> io::Error {
        match self {
            TranscodeError::Io(err) => err,
            other => io::Error::other(other.to_string()),
        }
    }
}

impl From<TranscodeError> for io::Error {
    fn from(err: TranscodeError) -> Self {
        err.into_io_error()
    }
}
