//! Legacy ID3v1.1 trailer rendering.
//!
//! Title, artist, album, year, track number and genre are taken from the
//! ID3v2 tag already built; everything else stays empty.

use lofty::config::WriteOptions;
use lofty::id3::v1::Id3v1Tag;
use lofty::tag::TagExt;

use crate::id3::constants::ID3V1_TAG_LEN;
use crate::id3::error::TagError;
use crate::id3::genres::genre_index;
use crate::id3::tag::Id3Tag;
use crate::types::MetaTag;

/// Render the 128-byte trailer from the text already held by `tag`.
pub fn render_v1(tag: &Id3Tag) -> Result<Vec<u8>, TagError> {
    let text = |key| tag.first_text(key).map(str::to_owned);

    let mut v1 = Id3v1Tag::new();
    v1.title = text(MetaTag::Title);
    v1.artist = text(MetaTag::Artist);
    v1.album = text(MetaTag::Album);
    v1.year = tag
        .first_text(MetaTag::Date)
        .map(|date| date.chars().take(4).collect());
    v1.track_number = tag.first_text(MetaTag::TrackNumber).and_then(leading_number);
    // always present, so an otherwise empty tag is still written
    v1.genre = Some(genre_index(tag.first_text(MetaTag::Genre).unwrap_or("")));

    let mut bytes = Vec::with_capacity(ID3V1_TAG_LEN);
    v1.dump_to(&mut bytes, WriteOptions::new())?;
    if bytes.len() != ID3V1_TAG_LEN {
        return Err(TagError::Render(format!(
            "ID3v1 tag is {} bytes, expected {}",
            bytes.len(),
            ID3V1_TAG_LEN
        )));
    }
    Ok(bytes)
}

/// Number before any `/`, e.g. `3` for `"3/12"`.
fn leading_number(value: &str) -> Option<u8> {
    value.split('/').next()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_v1_layout() {
        let mut tag = Id3Tag::new();
        tag.set_text(MetaTag::Title, Some("Song"));
        tag.set_text(MetaTag::Artist, Some("Artïst"));
        tag.set_text(MetaTag::Date, Some("1999-05-01"));
        tag.set_text(MetaTag::TrackNumber, Some("7"));
        tag.set_text(MetaTag::TrackTotal, Some("10"));
        tag.set_text(MetaTag::Genre, Some("Rock"));

        let bytes = render_v1(&tag).expect("render failed");
        assert_eq!(bytes.len(), 128);
        assert_eq!(&bytes[0..3], b"TAG");
        assert_eq!(&bytes[3..7], b"Song");
        assert!(bytes[7..33].iter().all(|&b| b == 0));
        assert_eq!(&bytes[33..39], b"Art\xEFst");
        assert!(bytes[63..93].iter().all(|&b| b == 0));
        assert_eq!(&bytes[93..97], b"1999");
        assert_eq!(bytes[125], 0);
        assert_eq!(bytes[126], 7);
        assert_eq!(bytes[127], 17);
    }

    #[test]
    fn test_render_v1_empty_tag() {
        let bytes = render_v1(&Id3Tag::new()).expect("render failed");
        assert_eq!(bytes.len(), 128);
        assert_eq!(&bytes[0..3], b"TAG");
        assert!(bytes[3..127].iter().all(|&b| b == 0));
        assert_eq!(bytes[127], 255);
    }

    #[test]
    fn test_long_title_is_truncated() {
        let mut tag = Id3Tag::new();
        tag.set_text(MetaTag::Title, Some(&"x".repeat(40)));
        let bytes = render_v1(&tag).expect("render failed");
        assert!(bytes[3..33].iter().all(|&b| b == b'x'));
        assert_eq!(bytes[33], 0);
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("3/12"), Some(3));
        assert_eq!(leading_number(" 9 "), Some(9));
        assert_eq!(leading_number("/12"), None);
        assert_eq!(leading_number("300"), None);
    }
}
