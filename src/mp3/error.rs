//! MP3 encoder error types.

use thiserror::Error;

use crate::buffer::BufferError;
use crate::id3::error::TagError;

/// Errors raised by [`Mp3Encoder`](crate::mp3::Mp3Encoder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncoderError {
    /// An operation was called out of order
    #[error("Cannot {operation} while encoder is {state}")]
    PreconditionFailed {
        operation: &'static str,
        state: &'static str,
    },

    #[error("Codec rejected configuration: {0}")]
    InitFailed(String),

    #[error("Codec failed to encode block (code {0})")]
    EncodeFailed(i32),

    #[error("Failed to finalize stream: {0}")]
    FinalizeFailed(String),

    #[error("Unsupported bits per sample: {0}")]
    InvalidBitDepth(u32),

    #[error("Block has {found} channels, stream was configured with {expected}")]
    ChannelMismatch { expected: u16, found: usize },

    #[error("Buffer error: {0}")]
    Buffer(#[from] BufferError),

    #[error("Tag error: {0}")]
    Tag(#[from] TagError),
}

impl EncoderError {
    pub const fn precondition(operation: &'static str, state: &'static str) -> Self {
        EncoderError::PreconditionFailed { operation, state }
    }

    pub fn init_failed(message: impl Into<String>) -> Self {
        EncoderError::InitFailed(message.into())
    }

    pub fn finalize_failed(message: impl Into<String>) -> Self {
        EncoderError::FinalizeFailed(message.into())
    }
}
