// Correctness and logic
#![warn(clippy::unit_cmp)] // Detects comparing unit types
#![warn(clippy::match_same_arms)] // Duplicate match arms
#![allow(clippy::result_large_err)] // Allow large error types for comprehensive error handling
#![allow(clippy::missing_const_for_fn)] // Functions may need mutations in the future
#![allow(clippy::collapsible_if)] // Sometimes clearer to have separate conditions
#![allow(clippy::unnecessary_cast)] // Explicit casts for clarity
#![allow(clippy::identity_op)] // Explicit operations for clarity

// Performance-focused
#![warn(clippy::inefficient_to_string)] // `format!("{}", x)` vs `x.to_string()`
#![warn(clippy::map_clone)] // Cloning inside `map()` unnecessarily
#![warn(clippy::unnecessary_to_owned)] // Detects redundant `.to_owned()` or `.clone()`
#![warn(clippy::large_stack_arrays)] // Helps avoid stack overflows
#![warn(clippy::needless_collect)] // Avoids `.collect().iter()` chains

// Style and idiomatic Rust
#![warn(clippy::redundant_clone)] // Detects unnecessary `.clone()`
#![warn(clippy::needless_return)] // Avoids `return` at the end of functions
#![warn(clippy::manual_map)] // Use `.map()` instead of manual `match`
#![warn(clippy::unwrap_used)] // Avoids using `unwrap()`
#![warn(clippy::panic)] // Avoids using `panic!` in production code

// Maintainability
#![warn(clippy::missing_safety_doc)] // Docs for `unsafe` functions

//! On-demand transcoding of lossless audio into MP3.
//!
//! A [`TranscodeSession`] turns one source file into an MP3 byte stream that
//! can be read at any offset while it is still being produced:
//!
//! - [`TranscodeBuffer`] holds the output and supports appends, in-place
//!   patches, and writes anchored to the not-yet-known end of file
//! - [`Mp3Encoder`] lays out ID3 tags and encoded audio and predicts the
//!   final size before any audio exists
//! - [`Id3Tag`] maps generic [`MetaTag`] keys onto ID3v2.4 frames
//! - [`flac::Picture`] decodes embedded cover art
//! - [`StatsCache`] remembers exact sizes of completed transcodes
//!
//! Decoding and the MPEG codec itself plug in through the [`Decoder`] and
//! [`Mp3Codec`] traits. The `lame` feature adds a codec on libmp3lame.

pub mod buffer;
pub mod cache;
pub mod error;
pub mod flac;
pub mod id3;
pub mod mp3;
pub mod session;
pub mod traits;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

use std::path::{Path, PathBuf};

pub use crate::{
    buffer::{BufferError, TranscodeBuffer},
    cache::StatsCache,
    error::{TranscodeError, TranscodeResult},
    id3::Id3Tag,
    mp3::{EncoderError, Mp3Codec, Mp3Encoder},
    session::{SessionStatus, TranscodeSession},
    traits::{Decoder, OutputSink, SizeCache, SourceKey},
    types::{
        BitrateMode, EncoderParams, GainMode, MetaTag, PcmBlock, ReplayGain, StreamParams,
    },
};

#[cfg(feature = "lame")]
pub use crate::mp3::LameCodec;

/// Source extensions a transcoding filesystem usually exposes as MP3.
pub const DEFAULT_DECODABLE_EXTENSIONS: [&str; 2] = ["flac", "ogg"];

/// Name a decodable source is exposed under.
///
/// Returns `path` with its extension replaced by `target_ext` if the extension
/// is one of `decodable_exts` (compared case-insensitively), `None` otherwise.
pub fn transcoded_name(path: &Path, decodable_exts: &[&str], target_ext: &str) -> Option<PathBuf> {
    let ext = path.extension()?.to_str()?;
    decodable_exts
        .iter()
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        .then(|| path.with_extension(target_ext))
}
