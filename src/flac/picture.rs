//! PICTURE metadata block decoding.
//!
//! Embedded cover art in FLAC (and in Ogg streams via `METADATA_BLOCK_PICTURE`)
//! uses a length-prefixed layout with big-endian integers:
//!
//! ```text
//! [type:u32][mime_len:u32][mime][desc_len:u32][desc (UTF-8)]
//! [width:u32][height:u32][depth:u32][colors:u32][data_len:u32][data]
//! ```
//!
//! Dimensions and colour information are consumed and discarded; the MP3 side
//! only needs the type code, MIME type, description, and image bytes.

use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::flac::constants::PICTURE_DIMENSION_FIELDS_SIZE;
use crate::flac::error::PictureError;

/// Standard picture roles, in type-code order (0 = other, 3 = front cover).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureType {
    Other,
    FileIcon,
    OtherFileIcon,
    FrontCover,
    BackCover,
    LeafletPage,
    Media,
    LeadArtist,
    Artist,
    Conductor,
    Band,
    Composer,
    Lyricist,
    RecordingLocation,
    DuringRecording,
    DuringPerformance,
    ScreenCapture,
    BrightFish,
    Illustration,
    BandLogo,
    PublisherLogo,
}

impl PictureType {
    const BY_CODE: [PictureType; 21] = {
        use PictureType::*;
        [
            Other,
            FileIcon,
            OtherFileIcon,
            FrontCover,
            BackCover,
            LeafletPage,
            Media,
            LeadArtist,
            Artist,
            Conductor,
            Band,
            Composer,
            Lyricist,
            RecordingLocation,
            DuringRecording,
            DuringPerformance,
            ScreenCapture,
            BrightFish,
            Illustration,
            BandLogo,
            PublisherLogo,
        ]
    };

    /// Role for a stored type code; codes past 20 are not standard.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::BY_CODE.get(code as usize).copied()
    }

    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// A decoded embedded picture. Immutable once decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picture {
    type_code: u32,
    mime_type: String,
    description: String,
    data: Vec<u8>,
}

impl Picture {
    pub fn new(
        type_code: u32,
        mime_type: impl Into<String>,
        description: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Picture {
            type_code,
            mime_type: mime_type.into(),
            description: description.into(),
            data,
        }
    }

    /// Decode a PICTURE block.
    ///
    /// Any truncated field or over-long length prefix fails the whole decode;
    /// no partially decoded picture is ever returned.
    pub fn decode(bytes: &[u8]) -> Result<Self, PictureError> {
        let mut reader = BlockReader::new(bytes);

        let type_code = reader.read_u32("picture type")?;
        let mime_type = reader.read_string("MIME type")?;
        let description = reader.read_string("description")?;
        reader.skip(PICTURE_DIMENSION_FIELDS_SIZE, "dimensions")?;
        let data_len = reader.read_u32("data length")? as usize;
        let data = reader.take(data_len, "picture data")?.to_vec();

        Ok(Picture {
            type_code,
            mime_type,
            description,
            data,
        })
    }

    /// Serialize to a PICTURE block with zeroed dimension fields.
    pub fn encode(&self) -> Result<Vec<u8>, PictureError> {
        let mut bytes = Vec::with_capacity(
            32 + self.mime_type.len() + self.description.len() + self.data.len(),
        );

        bytes.extend_from_slice(&self.type_code.to_be_bytes());
        for (field, value) in [
            ("MIME type", self.mime_type.as_bytes()),
            ("description", self.description.as_bytes()),
        ] {
            bytes.extend_from_slice(&length_prefix(field, value.len())?);
            bytes.extend_from_slice(value);
        }
        bytes.extend_from_slice(&[0u8; PICTURE_DIMENSION_FIELDS_SIZE]);
        bytes.extend_from_slice(&length_prefix("picture data", self.data.len())?);
        bytes.extend_from_slice(&self.data);

        Ok(bytes)
    }

    /// Numeric picture type code as stored in the block.
    pub const fn type_code(&self) -> u32 {
        self.type_code
    }

    /// Known picture type for the stored code, if any.
    pub fn picture_type(&self) -> Option<PictureType> {
        PictureType::from_code(self.type_code)
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Display for Picture {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "PICTURE type {} ({}), {} bytes",
            self.type_code,
            self.mime_type,
            self.data.len()
        )
    }
}

fn length_prefix(field: &'static str, len: usize) -> Result<[u8; 4], PictureError> {
    u32::try_from(len)
        .map(u32::to_be_bytes)
        .map_err(|_| PictureError::FieldTooLong { field, len })
}

/// Forward-only cursor over a metadata block.
struct BlockReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BlockReader<'a> {
    const fn new(bytes: &'a [u8]) -> Self {
        BlockReader { bytes, pos: 0 }
    }

    fn take(&mut self, len: usize, field: &'static str) -> Result<&'a [u8], PictureError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or(PictureError::unexpected_eof(field, self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn skip(&mut self, len: usize, field: &'static str) -> Result<(), PictureError> {
        self.take(len, field).map(|_| ())
    }

    fn read_u32(&mut self, field: &'static str) -> Result<u32, PictureError> {
        let bytes = self.take(4, field)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_string(&mut self, field: &'static str) -> Result<String, PictureError> {
        let len = self.read_u32(field)? as usize;
        let bytes = self.take(len, field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| PictureError::InvalidUtf8 { field })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_cover() -> Picture {
        Picture::new(3, "image/png", "Front ✓", vec![0x89, b'P', b'N', b'G', 1, 2, 3])
    }

    #[test]
    fn test_picture_roundtrip() {
        let picture = front_cover();
        let bytes = picture.encode().expect("encode failed");
        let decoded = Picture::decode(&bytes).expect("decode failed");

        assert_eq!(decoded, picture);
        assert_eq!(decoded.picture_type(), Some(PictureType::FrontCover));
        assert_eq!(PictureType::PublisherLogo.code(), 20);
        assert_eq!(PictureType::from_code(21), None);
    }

    #[test]
    fn test_picture_roundtrip_empty_fields() {
        let picture = Picture::new(0, "image/jpeg", "", Vec::new());
        let bytes = picture.encode().expect("encode failed");
        assert_eq!(bytes.len(), 4 + 4 + 10 + 4 + 16 + 4);

        let decoded = Picture::decode(&bytes).expect("decode failed");
        assert_eq!(decoded.description(), "");
        assert!(decoded.data().is_empty());
        assert_eq!(decoded.mime_type(), "image/jpeg");
    }

    #[test]
    fn test_field_order_is_big_endian() {
        let mut block = Vec::new();
        block.extend_from_slice(&[0, 0, 1, 2]); // type 258
        block.extend_from_slice(&[0, 0, 0, 3]);
        block.extend_from_slice(b"a/b");
        block.extend_from_slice(&[0, 0, 0, 1]);
        block.extend_from_slice(b"d");
        block.extend_from_slice(&[0xFF; 16]); // dimensions, ignored
        block.extend_from_slice(&[0, 0, 0, 2]);
        block.extend_from_slice(&[0xAB, 0xCD]);

        let picture = Picture::decode(&block).expect("decode failed");
        assert_eq!(picture.type_code(), 258);
        assert_eq!(picture.picture_type(), None);
        assert_eq!(picture.mime_type(), "a/b");
        assert_eq!(picture.description(), "d");
        assert_eq!(picture.data(), &[0xAB, 0xCD]);
    }

    #[test]
    fn test_truncated_blocks_fail() {
        let bytes = front_cover().encode().expect("encode failed");
        for cut in 0..bytes.len() {
            assert!(
                Picture::decode(&bytes[..cut]).is_err(),
                "decode of {} bytes should fail",
                cut
            );
        }
    }

    #[test]
    fn test_oversized_length_prefix_fails() {
        let mut block = Vec::new();
        block.extend_from_slice(&3u32.to_be_bytes());
        block.extend_from_slice(&u32::MAX.to_be_bytes());
        block.extend_from_slice(b"image/png");

        let result = Picture::decode(&block);
        assert_eq!(
            result,
            Err(PictureError::UnexpectedEof {
                field: "MIME type",
                offset: 8
            })
        );
    }

    #[test]
    fn test_invalid_utf8_description_fails() {
        let mut block = Vec::new();
        block.extend_from_slice(&3u32.to_be_bytes());
        block.extend_from_slice(&0u32.to_be_bytes());
        block.extend_from_slice(&2u32.to_be_bytes());
        block.extend_from_slice(&[0xC3, 0x28]);
        block.extend_from_slice(&[0u8; 20]);

        assert_eq!(
            Picture::decode(&block),
            Err(PictureError::InvalidUtf8 {
                field: "description"
            })
        );
    }
}
