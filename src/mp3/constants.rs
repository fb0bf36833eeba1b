//! MP3 encoder constants.

/// Largest possible VBR summary frame (the Xing/LAME header), in bytes
pub const MAX_VBR_FRAME_SIZE: usize = 2880;

/// Fixed margin added to the worst-case encode output size
pub const ENCODE_BUFFER_SLOP: usize = 7200;

/// Bytes per frame per (kbit/s / Hz) for a 1152-sample MPEG-1 Layer III frame
pub const SIZE_CONVERSION_FACTOR: u64 = 144_000;

/// PCM samples per channel in one MPEG-1 Layer III frame
pub const SAMPLES_PER_FRAME: u64 = 1152;

/// Native sample width expected by the codec
pub const CODEC_SAMPLE_BITS: u32 = 32;

/// Worst-case encoded size for `samples` input samples per channel.
pub const fn encode_buffer_size(samples: usize) -> usize {
    5 * samples / 4 + ENCODE_BUFFER_SLOP
}
