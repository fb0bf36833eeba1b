//! The MPEG Layer III codec seam.
//!
//! [`Mp3Encoder`](crate::mp3::Mp3Encoder) owns the state machine, tags and
//! buffer bookkeeping; the bit-level compression is delegated to an
//! [`Mp3Codec`] implementation (typically a binding to LAME).

use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::types::{BitrateMode, StreamParams};

/// Severity of a diagnostic emitted by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageLevel {
    Error,
    Debug,
    Info,
}

impl MessageLevel {
    pub const fn log_level(self) -> log::Level {
        match self {
            MessageLevel::Error => log::Level::Error,
            MessageLevel::Debug => log::Level::Debug,
            MessageLevel::Info => log::Level::Info,
        }
    }
}

/// Callback receiving codec diagnostics.
pub type MessageHandler = Box<dyn Fn(MessageLevel, &str) + Send + Sync>;

/// Forward a codec diagnostic to the `log` facade under the `lame` target.
pub fn route_codec_message(level: MessageLevel, message: &str) {
    log::log!(target: "lame", level.log_level(), "LAME: {}", message.trim_end());
}

/// The codec refused its configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError(pub String);

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// The codec returned a negative status while encoding or flushing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecFailure(pub i32);

/// An MPEG-1/2 Layer III compressor.
///
/// Calls arrive in a fixed order: configuration (`apply_mode`, `set_scale`,
/// `set_message_handler`), then `init_params` exactly once, then any number of
/// `encode` calls, one `flush`, and optionally `lametag_frame`.
pub trait Mp3Codec: Send {
    /// Select CBR or VBR at the given bitrate (kbit/s) and quality (0-9).
    fn apply_mode(&mut self, mode: BitrateMode, bitrate_kbps: u32, quality: u8);

    /// Install a diagnostic callback.
    fn set_message_handler(&mut self, handler: MessageHandler);

    /// Linear amplitude multiplier applied to every input sample.
    fn set_scale(&mut self, scale: f32);

    /// Validate and freeze the configuration for a stream.
    fn init_params(&mut self, params: &StreamParams) -> Result<(), CodecError>;

    /// Frames the codec expects to emit for the configured stream.
    fn total_frames(&self) -> u64;

    fn in_sample_rate(&self) -> u32;

    /// Output rate after any resampling the codec chose.
    fn out_sample_rate(&self) -> u32;

    /// Encode one block of full-width (32-bit) samples per channel.
    ///
    /// Returns the number of bytes written into `out`.
    fn encode(&mut self, left: &[i32], right: &[i32], out: &mut [u8]) -> Result<usize, CodecFailure>;

    /// Emit any internally buffered audio.
    fn flush(&mut self, out: &mut [u8]) -> Result<usize, CodecFailure>;

    /// Write the final VBR summary frame into `out`, returning its full size.
    ///
    /// A return larger than `out.len()` means the frame did not fit.
    fn lametag_frame(&mut self, out: &mut [u8]) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_levels_map_to_log_levels() {
        assert_eq!(MessageLevel::Error.log_level(), log::Level::Error);
        assert_eq!(MessageLevel::Debug.log_level(), log::Level::Debug);
        assert_eq!(MessageLevel::Info.log_level(), log::Level::Info);

        // no logger installed; routing must not panic
        route_codec_message(MessageLevel::Info, "Autoconverting from stereo to mono\n");
    }
}
