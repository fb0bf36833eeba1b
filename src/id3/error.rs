//! ID3-specific error types.

use lofty::error::LoftyError;
use thiserror::Error;

/// Errors raised while rendering ID3 tags.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    #[error("Tag body is {size} bytes, larger than a syncsafe size allows")]
    TagTooLarge { size: usize },

    /// The tag library refused a frame or failed to serialise the tag
    #[error("Failed to render tag: {0}")]
    Render(String),
}

impl From<LoftyError> for TagError {
    fn from(e: LoftyError) -> Self {
        TagError::Render(e.to_string())
    }
}
