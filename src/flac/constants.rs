//! FLAC metadata constants.

/// Width, height, colour depth and colour count in a PICTURE block (4 x u32)
pub const PICTURE_DIMENSION_FIELDS_SIZE: usize = 16;

/// Vorbis comment field holding the track ReplayGain adjustment
pub const REPLAYGAIN_TRACK_GAIN: &str = "REPLAYGAIN_TRACK_GAIN";

/// Vorbis comment field holding the album ReplayGain adjustment
pub const REPLAYGAIN_ALBUM_GAIN: &str = "REPLAYGAIN_ALBUM_GAIN";
