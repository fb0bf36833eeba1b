//! Output size prediction.

use crate::id3::constants::ID3V1_TAG_LEN;
use crate::mp3::constants::{MAX_VBR_FRAME_SIZE, SIZE_CONVERSION_FACTOR};
use crate::types::BitrateMode;

/// Inputs to [`estimate_size`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeInputs {
    pub mode: BitrateMode,
    pub bitrate_kbps: u32,
    /// Rendered ID3v2 header size in bytes
    pub header_len: usize,
    /// Frames the codec expects to emit
    pub total_frames: u64,
    pub in_sample_rate: u32,
    pub out_sample_rate: u32,
}

/// Predict the final output length.
///
/// CBR: `header + trailer + round(frames * 144000 * kbps / out_rate)`.
/// VBR reserves room for the summary frame and divides by the input rate,
/// since the codec counts VBR frames at the input rate.
pub fn estimate_size(inputs: &SizeInputs) -> usize {
    let (slack, rate) = match inputs.mode {
        BitrateMode::Vbr => (MAX_VBR_FRAME_SIZE, inputs.in_sample_rate),
        BitrateMode::Cbr => (0, inputs.out_sample_rate),
    };
    inputs.header_len + ID3V1_TAG_LEN + slack + audio_bytes(inputs, rate)
}

fn audio_bytes(inputs: &SizeInputs, rate: u32) -> usize {
    if rate == 0 {
        return 0;
    }
    let numerator = u128::from(inputs.total_frames)
        * u128::from(SIZE_CONVERSION_FACTOR)
        * u128::from(inputs.bitrate_kbps);
    let rate = u128::from(rate);
    let rounded = (numerator + rate / 2) / rate;
    usize::try_from(rounded).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cbr(total_frames: u64) -> SizeInputs {
        SizeInputs {
            mode: BitrateMode::Cbr,
            bitrate_kbps: 128,
            header_len: 0,
            total_frames,
            in_sample_rate: 44_100,
            out_sample_rate: 44_100,
        }
    }

    #[test]
    fn test_cbr_estimate_rounds() {
        // 869 * 144000 * 128 / 44100 = 363206.53
        assert_eq!(estimate_size(&cbr(869)), 128 + 363_207);
    }

    #[test]
    fn test_vbr_reserves_summary_frame() {
        let inputs = SizeInputs {
            mode: BitrateMode::Vbr,
            in_sample_rate: 48_000,
            out_sample_rate: 44_100,
            header_len: 100,
            ..cbr(10)
        };
        // 10 * 144000 * 128 / 48000 = 3840
        assert_eq!(estimate_size(&inputs), 100 + 128 + 2880 + 3840);
    }

    #[test]
    fn test_estimate_is_monotonic_in_frames() {
        let mut previous = 0;
        for frames in (0..5_000).step_by(7) {
            let size = estimate_size(&cbr(frames));
            assert!(size >= previous, "size shrank at {} frames", frames);
            previous = size;
        }
    }

    #[test]
    fn test_zero_rate_counts_only_tags() {
        let inputs = SizeInputs {
            out_sample_rate: 0,
            ..cbr(100)
        };
        assert_eq!(estimate_size(&inputs), 128);
    }
}
