//! ID3v2.4 frames as held by the tag mapper.
//!
//! Frames stay in this crate's own model while metadata is collected; they are
//! converted to `lofty` frames only when the tag is rendered.

use core::fmt::{Display, Formatter, Result as FmtResult};

use lofty::TextEncoding;
use lofty::id3::v2::{
    AttachedPictureFrame, Frame as Id3v2Frame, FrameId as Id3v2FrameId, TextInformationFrame,
};
use lofty::picture::{MimeType, Picture as LoftyPicture, PictureType as LoftyPictureType};

use crate::id3::error::TagError;

/// Four-character frame identifier such as `TIT2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId([u8; 4]);

impl FrameId {
    pub const TITLE: Self = Self(*b"TIT2");
    pub const ARTIST: Self = Self(*b"TPE1");
    pub const ALBUM: Self = Self(*b"TALB");
    pub const GENRE: Self = Self(*b"TCON");
    pub const RECORDING_TIME: Self = Self(*b"TDRC");
    pub const COMPOSER: Self = Self(*b"TCOM");
    pub const ORIGINAL_ARTIST: Self = Self(*b"TOPE");
    pub const COPYRIGHT: Self = Self(*b"TCOP");
    pub const ENCODED_BY: Self = Self(*b"TENC");
    pub const PUBLISHER: Self = Self(*b"TPUB");
    pub const CONDUCTOR: Self = Self(*b"TPE3");
    pub const BAND: Self = Self(*b"TPE2");
    pub const ENCODER_SETTINGS: Self = Self(*b"TSSE");
    pub const LENGTH: Self = Self(*b"TLEN");
    pub const TRACK: Self = Self(*b"TRCK");
    pub const PART_OF_SET: Self = Self(*b"TPOS");
    pub const PICTURE: Self = Self(*b"APIC");

    pub const fn new(id: [u8; 4]) -> Self {
        Self(id)
    }

    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl Display for FrameId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// Attached picture (`APIC`) contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureFrame {
    pub mime_type: String,
    pub picture_type: u8,
    pub description: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameBody {
    /// Text information frame; every value is kept, in insertion order
    Text(Vec<String>),
    Picture(PictureFrame),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub id: FrameId,
    pub body: FrameBody,
}

impl Frame {
    pub fn text(id: FrameId, values: Vec<String>) -> Self {
        Frame {
            id,
            body: FrameBody::Text(values),
        }
    }

    pub fn picture(picture: PictureFrame) -> Self {
        Frame {
            id: FrameId::PICTURE,
            body: FrameBody::Picture(picture),
        }
    }

    /// Text values, if this is a text frame.
    pub fn values(&self) -> Option<&[String]> {
        match &self.body {
            FrameBody::Text(values) => Some(values),
            FrameBody::Picture(_) => None,
        }
    }

    /// Encoded body size in bytes, excluding the 10-byte frame header.
    pub fn body_len(&self) -> usize {
        // leading text encoding byte
        1 + match &self.body {
            FrameBody::Text(values) => {
                values.iter().map(String::len).sum::<usize>() + values.len().saturating_sub(1)
            }
            FrameBody::Picture(picture) => {
                picture.mime_type.len() + 2 + picture.description.len() + 1 + picture.data.len()
            }
        }
    }

    /// Convert to the equivalent `lofty` frame. Multiple text values are
    /// NUL-separated as ID3v2.4 requires.
    pub(crate) fn to_id3v2(&self) -> Result<Id3v2Frame<'static>, TagError> {
        match &self.body {
            FrameBody::Text(values) => {
                let id = Id3v2FrameId::new(self.id.to_string())?;
                Ok(Id3v2Frame::Text(TextInformationFrame::new(
                    id,
                    TextEncoding::UTF8,
                    values.join("\0"),
                )))
            }
            FrameBody::Picture(picture) => {
                let picture = LoftyPicture::new_unchecked(
                    LoftyPictureType::from_u8(picture.picture_type),
                    Some(MimeType::from_str(&picture.mime_type)),
                    Some(picture.description.clone()),
                    picture.data.clone(),
                );
                Ok(Id3v2Frame::Picture(AttachedPictureFrame::new(
                    TextEncoding::UTF8,
                    picture,
                )))
            }
        }
    }
}
