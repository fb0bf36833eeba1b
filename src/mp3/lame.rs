//! [`Mp3Codec`] on top of libmp3lame.
//!
//! The library itself is built and linked by `mp3lame-sys`; the handful of
//! entry points used here are declared against `lame.h` directly.
//!
//! LAME reports its own diagnostics through printf-style callbacks taking a
//! `va_list`, which stable Rust cannot format. Those stay at LAME's defaults;
//! failures detected here are reported through the installed
//! [`MessageHandler`].

use core::ffi::{c_float, c_int, c_uchar, c_ulong};
use core::ptr::NonNull;

use mp3lame_sys as _;

use crate::mp3::codec::{CodecError, CodecFailure, MessageHandler, MessageLevel, Mp3Codec};
use crate::types::{BitrateMode, StreamParams};

/// Opaque `lame_global_flags`.
#[repr(C)]
struct LameGlobalFlags {
    _private: [u8; 0],
}

/// `vbr_mt` from LAME's `vbr_mode` enum
const VBR_MT: c_int = 1;

#[allow(non_snake_case)]
unsafe extern "C" {
    fn lame_init() -> *mut LameGlobalFlags;
    fn lame_close(gfp: *mut LameGlobalFlags) -> c_int;
    fn lame_init_params(gfp: *mut LameGlobalFlags) -> c_int;

    fn lame_set_num_samples(gfp: *mut LameGlobalFlags, samples: c_ulong) -> c_int;
    fn lame_set_in_samplerate(gfp: *mut LameGlobalFlags, rate: c_int) -> c_int;
    fn lame_set_num_channels(gfp: *mut LameGlobalFlags, channels: c_int) -> c_int;
    fn lame_set_scale(gfp: *mut LameGlobalFlags, scale: c_float) -> c_int;
    fn lame_set_quality(gfp: *mut LameGlobalFlags, quality: c_int) -> c_int;
    fn lame_set_brate(gfp: *mut LameGlobalFlags, kbps: c_int) -> c_int;
    fn lame_set_VBR(gfp: *mut LameGlobalFlags, mode: c_int) -> c_int;
    fn lame_set_VBR_q(gfp: *mut LameGlobalFlags, quality: c_int) -> c_int;
    fn lame_set_VBR_max_bitrate_kbps(gfp: *mut LameGlobalFlags, kbps: c_int) -> c_int;
    fn lame_set_bWriteVbrTag(gfp: *mut LameGlobalFlags, write: c_int) -> c_int;

    fn lame_get_totalframes(gfp: *const LameGlobalFlags) -> c_int;
    fn lame_get_in_samplerate(gfp: *const LameGlobalFlags) -> c_int;
    fn lame_get_out_samplerate(gfp: *const LameGlobalFlags) -> c_int;

    fn lame_encode_buffer_int(
        gfp: *mut LameGlobalFlags,
        left: *const c_int,
        right: *const c_int,
        samples: c_int,
        out: *mut c_uchar,
        out_size: c_int,
    ) -> c_int;
    fn lame_encode_flush(gfp: *mut LameGlobalFlags, out: *mut c_uchar, out_size: c_int) -> c_int;
    fn lame_get_lametag_frame(gfp: *const LameGlobalFlags, out: *mut c_uchar, size: usize)
    -> usize;
}

/// A LAME encoder context.
pub struct LameCodec {
    gfp: NonNull<LameGlobalFlags>,
    handler: Option<MessageHandler>,
    initialised: bool,
    /// Gain requested after `init_params`, applied to samples before encoding
    late_scale: Option<f32>,
}

// SAFETY: the context has no thread affinity and is only reached through
// `&mut self`, so moving it to another thread is sound.
unsafe impl Send for LameCodec {}

impl core::fmt::Debug for LameCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LameCodec")
            .field("initialised", &self.initialised)
            .field("late_scale", &self.late_scale)
            .finish_non_exhaustive()
    }
}

impl LameCodec {
    /// Allocate a fresh LAME context.
    pub fn new() -> Result<Self, CodecError> {
        // SAFETY: lame_init has no preconditions and returns null on failure.
        let gfp = NonNull::new(unsafe { lame_init() })
            .ok_or_else(|| CodecError("lame_init failed".to_string()))?;
        Ok(LameCodec {
            gfp,
            handler: None,
            initialised: false,
            late_scale: None,
        })
    }

    fn report(&self, level: MessageLevel, message: &str) {
        if let Some(handler) = &self.handler {
            handler(level, message);
        }
    }

    /// Log a non-zero status from a LAME setter.
    fn check(&self, call: &str, status: c_int) {
        if status != 0 {
            self.report(MessageLevel::Error, &format!("{} returned {}", call, status));
        }
    }

    fn scaled(samples: &[i32], scale: f32) -> Vec<i32> {
        samples
            .iter()
            .map(|&s| (s as f64 * scale as f64).clamp(i32::MIN as f64, i32::MAX as f64) as i32)
            .collect()
    }
}

impl Drop for LameCodec {
    fn drop(&mut self) {
        // SAFETY: gfp came from lame_init and is closed exactly once here.
        unsafe {
            lame_close(self.gfp.as_ptr());
        }
    }
}

fn to_c_int(value: impl TryInto<c_int>) -> c_int {
    value.try_into().unwrap_or(c_int::MAX)
}

impl Mp3Codec for LameCodec {
    fn apply_mode(&mut self, mode: BitrateMode, bitrate_kbps: u32, quality: u8) {
        let gfp = self.gfp.as_ptr();
        let kbps = to_c_int(bitrate_kbps);
        let quality = c_int::from(quality);
        // SAFETY: gfp is a live context; setters only store configuration.
        let statuses = unsafe {
            match mode {
                BitrateMode::Vbr => vec![
                    ("lame_set_VBR", lame_set_VBR(gfp, VBR_MT)),
                    ("lame_set_VBR_q", lame_set_VBR_q(gfp, quality)),
                    (
                        "lame_set_VBR_max_bitrate_kbps",
                        lame_set_VBR_max_bitrate_kbps(gfp, kbps),
                    ),
                    ("lame_set_bWriteVbrTag", lame_set_bWriteVbrTag(gfp, 1)),
                ],
                BitrateMode::Cbr => vec![
                    ("lame_set_quality", lame_set_quality(gfp, quality)),
                    ("lame_set_brate", lame_set_brate(gfp, kbps)),
                    ("lame_set_bWriteVbrTag", lame_set_bWriteVbrTag(gfp, 0)),
                ],
            }
        };
        for (call, status) in statuses {
            self.check(call, status);
        }
    }

    fn set_message_handler(&mut self, handler: MessageHandler) {
        self.handler = Some(handler);
    }

    fn set_scale(&mut self, scale: f32) {
        if self.initialised {
            // LAME reads the scale only in lame_init_params
            self.late_scale = Some(scale);
            return;
        }
        // SAFETY: gfp is a live context.
        let status = unsafe { lame_set_scale(self.gfp.as_ptr(), scale) };
        self.check("lame_set_scale", status);
    }

    fn init_params(&mut self, params: &StreamParams) -> Result<(), CodecError> {
        if self.initialised {
            return Err(CodecError("parameters already initialised".to_string()));
        }
        if params.sample_rate == 0 || !(1..=2).contains(&params.channels) {
            return Err(CodecError(format!("unsupported stream: {}", params)));
        }

        let gfp = self.gfp.as_ptr();
        let samples = c_ulong::try_from(params.total_samples).unwrap_or(c_ulong::MAX);
        // SAFETY: gfp is a live context that has not been initialised yet.
        let status = unsafe {
            lame_set_num_samples(gfp, samples);
            lame_set_in_samplerate(gfp, to_c_int(params.sample_rate));
            lame_set_num_channels(gfp, c_int::from(params.channels));
            lame_init_params(gfp)
        };
        if status < 0 {
            self.report(MessageLevel::Error, "lame_init_params failed");
            return Err(CodecError(format!(
                "lame_init_params failed ({}) for {}",
                status, params
            )));
        }
        self.initialised = true;
        Ok(())
    }

    fn total_frames(&self) -> u64 {
        // SAFETY: gfp is a live context; getters do not mutate.
        let frames = unsafe { lame_get_totalframes(self.gfp.as_ptr()) };
        u64::try_from(frames).unwrap_or(0)
    }

    fn in_sample_rate(&self) -> u32 {
        // SAFETY: as above.
        u32::try_from(unsafe { lame_get_in_samplerate(self.gfp.as_ptr()) }).unwrap_or(0)
    }

    fn out_sample_rate(&self) -> u32 {
        // SAFETY: as above.
        u32::try_from(unsafe { lame_get_out_samplerate(self.gfp.as_ptr()) }).unwrap_or(0)
    }

    fn encode(&mut self, left: &[i32], right: &[i32], out: &mut [u8]) -> Result<usize, CodecFailure> {
        if left.len() != right.len() {
            self.report(MessageLevel::Error, "channel blocks differ in length");
            return Err(CodecFailure(-1));
        }
        let samples = c_int::try_from(left.len()).map_err(|_| CodecFailure(-1))?;

        let scaled;
        let (left, right) = match self.late_scale {
            Some(scale) => {
                scaled = (Self::scaled(left, scale), Self::scaled(right, scale));
                (&scaled.0[..], &scaled.1[..])
            }
            None => (left, right),
        };

        // SAFETY: both inputs hold `samples` values and `out` is writable for
        // the length passed; LAME writes at most that many bytes.
        let written = unsafe {
            lame_encode_buffer_int(
                self.gfp.as_ptr(),
                left.as_ptr(),
                right.as_ptr(),
                samples,
                out.as_mut_ptr(),
                to_c_int(out.len()),
            )
        };
        usize::try_from(written).map_err(|_| {
            self.report(
                MessageLevel::Error,
                &format!("lame_encode_buffer_int failed ({})", written),
            );
            CodecFailure(written)
        })
    }

    fn flush(&mut self, out: &mut [u8]) -> Result<usize, CodecFailure> {
        // SAFETY: `out` is writable for the length passed.
        let written =
            unsafe { lame_encode_flush(self.gfp.as_ptr(), out.as_mut_ptr(), to_c_int(out.len())) };
        usize::try_from(written).map_err(|_| {
            self.report(
                MessageLevel::Error,
                &format!("lame_encode_flush failed ({})", written),
            );
            CodecFailure(written)
        })
    }

    fn lametag_frame(&mut self, out: &mut [u8]) -> usize {
        // SAFETY: `out` is writable for the length passed. A frame that does
        // not fit is not written and its full size is returned.
        unsafe { lame_get_lametag_frame(self.gfp.as_ptr(), out.as_mut_ptr(), out.len()) }
    }
}
