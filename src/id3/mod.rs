//! ID3 tag construction.
//!
//! [`Id3Tag`] maps generic [`MetaTag`](crate::MetaTag) keys onto ID3v2.4
//! frames and renders the header tag. [`render_v1`] renders the fixed-size
//! ID3v1.1 trailer from the same data.

pub mod constants;
pub mod error;
pub mod frame;
pub mod genres;
pub mod tag;
pub mod v1;

pub use error::TagError;
pub use frame::{Frame, FrameBody, FrameId, PictureFrame};
pub use tag::Id3Tag;
pub use v1::render_v1;
