//! FLAC metadata handling.
//!
//! Only the metadata the MP3 side carries over is handled here:
//!
//! - `picture`: PICTURE block decoding (embedded cover art)
//! - `vorbis`: Vorbis comment field names and ReplayGain values
//!
//! Audio decoding itself sits behind the [`Decoder`](crate::traits::Decoder)
//! trait.
//!
//! # Example
//!
//! ```
//! use audio_transcode_io::flac::Picture;
//!
//! let block = Picture::new(3, "image/jpeg", "cover", vec![0xFF, 0xD8]).encode()?;
//! let picture = Picture::decode(&block)?;
//! assert_eq!(picture.mime_type(), "image/jpeg");
//! # Ok::<(), audio_transcode_io::flac::PictureError>(())
//! ```

pub mod constants;
pub mod error;
pub mod picture;
pub mod vorbis;

// Re-exports
pub use error::PictureError;
pub use picture::{Picture, PictureType};
pub use vorbis::parse_gain_db;
