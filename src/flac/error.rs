//! FLAC metadata error types.

use thiserror::Error;

/// Errors raised while decoding a PICTURE metadata block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PictureError {
    #[error("Picture block truncated reading {field} at byte offset {offset}")]
    UnexpectedEof { field: &'static str, offset: usize },

    #[error("Picture {field} is not valid UTF-8")]
    InvalidUtf8 { field: &'static str },

    #[error("Picture {field} length {len} does not fit a 32-bit length prefix")]
    FieldTooLong { field: &'static str, len: usize },
}

impl PictureError {
    pub const fn unexpected_eof(field: &'static str, offset: usize) -> Self {
        PictureError::UnexpectedEof { field, offset }
    }
}
