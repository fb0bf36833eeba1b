//! Vorbis comment field mapping.
//!
//! FLAC and Ogg sources carry tags as `KEY=value` Vorbis comments. Decoders use
//! these helpers to translate field names into [`MetaTag`] keys and to pick up
//! ReplayGain adjustments.

use crate::flac::constants::{REPLAYGAIN_ALBUM_GAIN, REPLAYGAIN_TRACK_GAIN};
use crate::types::{MetaTag, ReplayGain};

impl MetaTag {
    /// Map a Vorbis comment field name (case-insensitive) onto a generic key.
    pub fn from_vorbis_key(key: &str) -> Option<Self> {
        let tag = match key.to_ascii_uppercase().as_str() {
            "TITLE" => MetaTag::Title,
            "ARTIST" => MetaTag::Artist,
            "ALBUM" => MetaTag::Album,
            "GENRE" => MetaTag::Genre,
            "DATE" => MetaTag::Date,
            "COMPOSER" => MetaTag::Composer,
            "PERFORMER" => MetaTag::Performer,
            "COPYRIGHT" => MetaTag::Copyright,
            "ENCODED-BY" | "ENCODED_BY" | "ENCODEDBY" => MetaTag::EncodedBy,
            "ORGANIZATION" => MetaTag::Organization,
            "CONDUCTOR" => MetaTag::Conductor,
            "ALBUMARTIST" | "ALBUM ARTIST" | "ALBUM_ARTIST" => MetaTag::AlbumArtist,
            "TRACKNUMBER" => MetaTag::TrackNumber,
            "TRACKTOTAL" | "TOTALTRACKS" => MetaTag::TrackTotal,
            "DISCNUMBER" => MetaTag::DiscNumber,
            "DISCTOTAL" | "TOTALDISCS" => MetaTag::DiscTotal,
            _ => return None,
        };
        Some(tag)
    }
}

/// Parse a ReplayGain value such as `"-6.48 dB"` into decibels.
pub fn parse_gain_db(value: &str) -> Option<f64> {
    let trimmed = value.trim();
    let number = trimmed
        .strip_suffix("dB")
        .or_else(|| trimmed.strip_suffix("db"))
        .unwrap_or(trimmed)
        .trim();
    number.parse::<f64>().ok().filter(|db| db.is_finite())
}

impl ReplayGain {
    /// Collect ReplayGain values from Vorbis comment `(key, value)` pairs.
    ///
    /// Unparseable values are ignored; the last valid value for a field wins.
    pub fn from_vorbis_comments<'a, I>(comments: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut gain = ReplayGain::default();
        for (key, value) in comments {
            let key = key.to_ascii_uppercase();
            if key == REPLAYGAIN_TRACK_GAIN {
                gain.track_db = parse_gain_db(value).or(gain.track_db);
            } else if key == REPLAYGAIN_ALBUM_GAIN {
                gain.album_db = parse_gain_db(value).or(gain.album_db);
            }
        }
        gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vorbis_keys_map_case_insensitively() {
        assert_eq!(MetaTag::from_vorbis_key("title"), Some(MetaTag::Title));
        assert_eq!(
            MetaTag::from_vorbis_key("Album Artist"),
            Some(MetaTag::AlbumArtist)
        );
        assert_eq!(
            MetaTag::from_vorbis_key("TOTALTRACKS"),
            Some(MetaTag::TrackTotal)
        );
        assert_eq!(
            MetaTag::from_vorbis_key("discnumber"),
            Some(MetaTag::DiscNumber)
        );
        assert_eq!(MetaTag::from_vorbis_key("LYRICS"), None);
    }

    #[test]
    fn test_parse_gain_db() {
        assert_eq!(parse_gain_db("-6.48 dB"), Some(-6.48));
        assert_eq!(parse_gain_db("+2.5dB"), Some(2.5));
        assert_eq!(parse_gain_db(" 1 "), Some(1.0));
        assert_eq!(parse_gain_db("loud"), None);
        assert_eq!(parse_gain_db("NaN dB"), None);
    }

    #[test]
    fn test_replaygain_from_comments() {
        let comments = [
            ("ARTIST", "Someone"),
            ("replaygain_track_gain", "-3.20 dB"),
            ("REPLAYGAIN_ALBUM_GAIN", "garbage"),
        ];
        let gain = ReplayGain::from_vorbis_comments(comments);
        assert_eq!(gain.track_db, Some(-3.2));
        assert_eq!(gain.album_db, None);
    }
}
