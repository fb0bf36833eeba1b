//! Mapping generic metadata onto ID3v2.4 frames.

use lofty::config::WriteOptions;
use lofty::id3::v2::Id3v2Tag;
use lofty::tag::TagExt;

use crate::id3::constants::{FRAME_HEADER_SIZE, MAX_SYNCSAFE};
use crate::id3::error::TagError;
use crate::id3::frame::{Frame, FrameBody, FrameId, PictureFrame};
use crate::types::MetaTag;

/// An in-memory ID3v2.4 tag under construction.
///
/// Frames keep their insertion order. Text frames accumulate values, picture
/// frames never merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Id3Tag {
    frames: Vec<Frame>,
}

impl Id3Tag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame id a generic key maps onto. Number/total pairs share one frame.
    pub const fn frame_id(key: MetaTag) -> FrameId {
        match key {
            MetaTag::Title => FrameId::TITLE,
            MetaTag::Artist => FrameId::ARTIST,
            MetaTag::Album => FrameId::ALBUM,
            MetaTag::Genre => FrameId::GENRE,
            MetaTag::Date => FrameId::RECORDING_TIME,
            MetaTag::Composer => FrameId::COMPOSER,
            MetaTag::Performer => FrameId::ORIGINAL_ARTIST,
            MetaTag::Copyright => FrameId::COPYRIGHT,
            MetaTag::EncodedBy => FrameId::ENCODED_BY,
            MetaTag::Organization => FrameId::PUBLISHER,
            MetaTag::Conductor => FrameId::CONDUCTOR,
            MetaTag::AlbumArtist => FrameId::BAND,
            MetaTag::Encoder => FrameId::ENCODER_SETTINGS,
            MetaTag::TrackLength => FrameId::LENGTH,
            MetaTag::TrackNumber | MetaTag::TrackTotal => FrameId::TRACK,
            MetaTag::DiscNumber | MetaTag::DiscTotal => FrameId::PART_OF_SET,
        }
    }

    /// Add a text value for `key`. `None` is a no-op.
    ///
    /// Plain keys gain an extra value on their frame. A number is prefixed
    /// to whatever the shared pair frame already holds and a total is
    /// appended after `/`, so both orders end up as `"number/total"`.
    pub fn set_text(&mut self, key: MetaTag, value: Option<&str>) {
        let Some(value) = value else {
            return;
        };
        let id = Self::frame_id(key);

        if !key.is_number_pair() {
            match self.text_frame_mut(id) {
                Some(values) => values.push(value.to_owned()),
                None => self.frames.push(Frame::text(id, vec![value.to_owned()])),
            }
            return;
        }

        let merged = {
            let existing = self
                .text(id)
                .and_then(|values| values.first())
                .map(String::as_str)
                .unwrap_or("");
            match key {
                MetaTag::TrackNumber | MetaTag::DiscNumber => format!("{}{}", value, existing),
                _ => format!("{}/{}", existing, value),
            }
        };
        match self.text_frame_mut(id) {
            Some(values) => *values = vec![merged],
            None => self.frames.push(Frame::text(id, vec![merged])),
        }
    }

    /// Add a raw text value as read from a source file.
    ///
    /// Values that are not valid UTF-8 are dropped with a warning.
    pub fn set_text_bytes(&mut self, key: MetaTag, value: &[u8]) {
        match core::str::from_utf8(value) {
            Ok(text) => self.set_text(key, Some(text)),
            Err(e) => log::warn!("Dropping {} tag value: {}", key, e),
        }
    }

    /// Attach a picture. Every call adds a new `APIC` frame.
    pub fn add_picture(&mut self, mime_type: &str, picture_type: u8, description: &str, data: &[u8]) {
        self.frames.push(Frame::picture(PictureFrame {
            mime_type: mime_type.to_owned(),
            picture_type,
            description: description.to_owned(),
            data: data.to_vec(),
        }));
    }

    /// Values of the first text frame with this id.
    pub fn text(&self, id: FrameId) -> Option<&[String]> {
        self.frames
            .iter()
            .find(|frame| frame.id == id)
            .and_then(Frame::values)
    }

    /// First value of the frame a key maps onto.
    pub fn first_text(&self, key: MetaTag) -> Option<&str> {
        self.text(Self::frame_id(key))
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn pictures(&self) -> impl Iterator<Item = &PictureFrame> {
        self.frames.iter().filter_map(|frame| match &frame.body {
            FrameBody::Picture(picture) => Some(picture),
            FrameBody::Text(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Render an uncompressed ID3v2.4 tag followed by `padding` zero bytes.
    ///
    /// A frame too large for a syncsafe size is left out with a warning; the
    /// rest of the tag is still rendered.
    pub fn render(&self, padding: usize) -> Result<Vec<u8>, TagError> {
        self.render_within(padding, MAX_SYNCSAFE as usize)
    }

    fn render_within(&self, padding: usize, max_frame_len: usize) -> Result<Vec<u8>, TagError> {
        let mut id3v2 = Id3v2Tag::new();
        let mut body_len = padding;
        for frame in &self.frames {
            let len = frame.body_len();
            if len > max_frame_len {
                log::warn!("Leaving {} frame of {} bytes out of the tag", frame.id, len);
                continue;
            }
            body_len = body_len.saturating_add(FRAME_HEADER_SIZE + len);
            id3v2.insert(frame.to_id3v2()?);
        }
        if body_len > MAX_SYNCSAFE as usize {
            return Err(TagError::TagTooLarge { size: body_len });
        }

        let padding = u32::try_from(padding).map_err(|_| TagError::TagTooLarge { size: padding })?;
        let mut bytes = Vec::with_capacity(body_len + 10);
        id3v2.dump_to(
            &mut bytes,
            WriteOptions::new().preferred_padding(padding),
        )?;
        Ok(bytes)
    }

    fn text_frame_mut(&mut self, id: FrameId) -> Option<&mut Vec<String>> {
        self.frames
            .iter_mut()
            .filter(|frame| frame.id == id)
            .find_map(|frame| match &mut frame.body {
                FrameBody::Text(values) => Some(values),
                FrameBody::Picture(_) => None,
            })
    }
}
