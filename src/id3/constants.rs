//! ID3 constants and magic numbers.

/// ID3v2 frame header size in bytes (id, size, flags)
pub const FRAME_HEADER_SIZE: usize = 10;

/// Largest value a 4-byte syncsafe integer can hold (28 bits)
pub const MAX_SYNCSAFE: u32 = 0x0FFF_FFFF;

/// Zero bytes appended after the frames; some players mis-parse tags without it
pub const HEADER_TAG_PADDING: usize = 12;

/// ID3v1 tags are always exactly 128 bytes
pub const ID3V1_TAG_LEN: usize = 128;

/// Genre byte meaning "no genre"
pub const ID3V1_NO_GENRE: u8 = 255;
