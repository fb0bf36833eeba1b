use core::fmt::{Display, Formatter, Result as FmtResult};
use core::str::FromStr;
use std::time::Duration;

use ndarray::{Array2, ArrayView1};

/// Parameters of a decoded PCM stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamParams {
    /// Samples per channel in the whole stream
    pub total_samples: u64,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of audio channels
    pub channels: u16,
}

impl StreamParams {
    pub const fn new(total_samples: u64, sample_rate: u32, channels: u16) -> Self {
        StreamParams {
            total_samples,
            sample_rate,
            channels,
        }
    }

    /// Track length in whole milliseconds, `None` for a zero sample rate.
    ///
    /// Saturates at `u64::MAX` for absurd sample counts.
    pub const fn duration_ms(&self) -> Option<u64> {
        if self.sample_rate == 0 {
            return None;
        }
        let ms = self.total_samples as u128 * 1000 / self.sample_rate as u128;
        if ms > u64::MAX as u128 {
            return Some(u64::MAX);
        }
        Some(ms as u64)
    }

    pub const fn duration(&self) -> Option<Duration> {
        match self.duration_ms() {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }
}

impl Display for StreamParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} Hz, {} ch, {} samples",
            self.sample_rate, self.channels, self.total_samples
        )
    }
}

/// A block of decoded audio: one row of fixed-point samples per channel.
///
/// Samples are right-aligned: they occupy the low `bits_per_sample` bits of
/// each `i32`, sign-extended.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBlock {
    samples: Array2<i32>,
    bits_per_sample: u32,
}

impl PcmBlock {
    /// Create a block from a `(channels, samples_per_channel)` array.
    pub fn new(samples: Array2<i32>, bits_per_sample: u32) -> Self {
        PcmBlock {
            samples,
            bits_per_sample,
        }
    }

    /// Create a block from one sample vector per channel.
    ///
    /// Returns `None` if the channels differ in length or there are none.
    pub fn from_channels(channels: &[Vec<i32>], bits_per_sample: u32) -> Option<Self> {
        let samples_per_channel = channels.first()?.len();
        if channels.iter().any(|c| c.len() != samples_per_channel) {
            return None;
        }
        let flat: Vec<i32> = channels.iter().flatten().copied().collect();
        Array2::from_shape_vec((channels.len(), samples_per_channel), flat)
            .ok()
            .map(|samples| PcmBlock::new(samples, bits_per_sample))
    }

    pub fn num_channels(&self) -> usize {
        self.samples.nrows()
    }

    pub fn samples_per_channel(&self) -> usize {
        self.samples.ncols()
    }

    pub const fn bits_per_sample(&self) -> u32 {
        self.bits_per_sample
    }

    pub fn channel(&self, index: usize) -> Option<ArrayView1<'_, i32>> {
        (index < self.num_channels()).then(|| self.samples.row(index))
    }

    pub const fn samples(&self) -> &Array2<i32> {
        &self.samples
    }
}

/// Generic metadata keys understood by every encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaTag {
    Title,
    Artist,
    Album,
    Genre,
    Date,
    Composer,
    Performer,
    Copyright,
    EncodedBy,
    Organization,
    Conductor,
    AlbumArtist,
    Encoder,
    TrackLength,
    TrackNumber,
    TrackTotal,
    DiscNumber,
    DiscTotal,
}

impl MetaTag {
    pub const ALL: [MetaTag; 18] = [
        MetaTag::Title,
        MetaTag::Artist,
        MetaTag::Album,
        MetaTag::Genre,
        MetaTag::Date,
        MetaTag::Composer,
        MetaTag::Performer,
        MetaTag::Copyright,
        MetaTag::EncodedBy,
        MetaTag::Organization,
        MetaTag::Conductor,
        MetaTag::AlbumArtist,
        MetaTag::Encoder,
        MetaTag::TrackLength,
        MetaTag::TrackNumber,
        MetaTag::TrackTotal,
        MetaTag::DiscNumber,
        MetaTag::DiscTotal,
    ];

    /// Whether this key is one half of a number/total pair.
    pub const fn is_number_pair(self) -> bool {
        matches!(
            self,
            MetaTag::TrackNumber | MetaTag::TrackTotal | MetaTag::DiscNumber | MetaTag::DiscTotal
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MetaTag::Title => "title",
            MetaTag::Artist => "artist",
            MetaTag::Album => "album",
            MetaTag::Genre => "genre",
            MetaTag::Date => "date",
            MetaTag::Composer => "composer",
            MetaTag::Performer => "performer",
            MetaTag::Copyright => "copyright",
            MetaTag::EncodedBy => "encoded-by",
            MetaTag::Organization => "organization",
            MetaTag::Conductor => "conductor",
            MetaTag::AlbumArtist => "album-artist",
            MetaTag::Encoder => "encoder",
            MetaTag::TrackLength => "track-length",
            MetaTag::TrackNumber => "track-number",
            MetaTag::TrackTotal => "track-total",
            MetaTag::DiscNumber => "disc-number",
            MetaTag::DiscTotal => "disc-total",
        }
    }
}

impl Display for MetaTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

/// Constant or variable bitrate encoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum BitrateMode {
    #[default]
    Cbr,
    Vbr,
}

impl BitrateMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            BitrateMode::Cbr => "cbr",
            BitrateMode::Vbr => "vbr",
        }
    }

    pub const fn is_vbr(self) -> bool {
        matches!(self, BitrateMode::Vbr)
    }
}

impl Display for BitrateMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BitrateMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cbr" | "CBR" => Ok(BitrateMode::Cbr),
            "vbr" | "VBR" => Ok(BitrateMode::Vbr),
            _ => Err(()),
        }
    }
}

/// Which ReplayGain value, if any, is applied while encoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GainMode {
    None,
    /// Album gain, falling back to track gain
    #[default]
    Album,
    Track,
}

impl Display for GainMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            GainMode::None => "none",
            GainMode::Album => "album",
            GainMode::Track => "track",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for GainMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0" | "none" => Ok(GainMode::None),
            "1" | "album" => Ok(GainMode::Album),
            "2" | "track" => Ok(GainMode::Track),
            _ => Err(()),
        }
    }
}

/// ReplayGain adjustments found in a source's tags, in dB.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ReplayGain {
    pub track_db: Option<f64>,
    pub album_db: Option<f64>,
}

impl ReplayGain {
    /// Gain to apply under `mode`, before any reference adjustment.
    pub fn select(&self, mode: GainMode) -> Option<f64> {
        match mode {
            GainMode::None => None,
            GainMode::Album => self.album_db.or(self.track_db),
            GainMode::Track => self.track_db,
        }
    }
}

/// Encoder configuration, normally filled from mount options.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EncoderParams {
    pub mode: BitrateMode,
    /// Target bitrate for CBR, maximum bitrate for VBR, in kbit/s
    pub bitrate_kbps: u32,
    /// Codec quality, 0 (best) to 9 (fastest)
    pub quality: u8,
    pub gain_mode: GainMode,
    /// Added to the selected ReplayGain value, in dB
    pub gain_ref_db: f64,
}

impl EncoderParams {
    /// Gain to apply for a source with the given ReplayGain values.
    pub fn gain_db(&self, gain: &ReplayGain) -> Option<f64> {
        gain.select(self.gain_mode).map(|db| db + self.gain_ref_db)
    }
}

impl Default for EncoderParams {
    fn default() -> Self {
        EncoderParams {
            mode: BitrateMode::Cbr,
            bitrate_kbps: 320,
            quality: 5,
            gain_mode: GainMode::Album,
            gain_ref_db: 0.0,
        }
    }
}
