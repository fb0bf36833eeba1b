//! MP3 encoding.
//!
//! [`Mp3Encoder`] writes an ID3-tagged MP3 stream into an
//! [`OutputSink`](crate::traits::OutputSink), delegating compression to an
//! [`Mp3Codec`]. With the `lame` feature, `LameCodec` provides one on top of
//! libmp3lame.

pub mod codec;
pub mod constants;
pub mod encoder;
pub mod error;
#[cfg(feature = "lame")]
pub mod lame;
pub mod size;

pub use codec::{CodecError, CodecFailure, MessageHandler, MessageLevel, Mp3Codec};
pub use encoder::{EncoderResult, EncoderState, Mp3Encoder};
pub use error::EncoderError;
#[cfg(feature = "lame")]
pub use lame::LameCodec;
pub use size::{SizeInputs, estimate_size};
