//! MP3 output writer.
//!
//! Output layout:
//!
//! ```text
//! [ID3v2.4 tag + padding][VBR summary frame (VBR only)][audio frames][ID3v1 tag]
//! ```
//!
//! The ID3v1 trailer is written before any audio, anchored to the end of the
//! file, so the last 128 bytes are correct whatever the final length turns out
//! to be. The VBR summary frame is written by the codec as a placeholder and
//! patched in place once the real frame count is known.

use core::fmt::{Display, Formatter, Result as FmtResult};

use crate::flac::picture::Picture;
use crate::id3::constants::{HEADER_TAG_PADDING, ID3V1_TAG_LEN};
use crate::id3::{Id3Tag, render_v1};
use crate::mp3::codec::{Mp3Codec, route_codec_message};
use crate::mp3::constants::{CODEC_SAMPLE_BITS, MAX_VBR_FRAME_SIZE, encode_buffer_size};
use crate::mp3::error::EncoderError;
use crate::mp3::size::{SizeInputs, estimate_size};
use crate::traits::OutputSink;
use crate::types::{EncoderParams, MetaTag, PcmBlock, StreamParams};

/// Lifecycle of an [`Mp3Encoder`]. Each state is entered once, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EncoderState {
    Created,
    StreamConfigured,
    TagRendered,
    Encoding,
    Finished,
}

impl EncoderState {
    pub const fn as_str(self) -> &'static str {
        match self {
            EncoderState::Created => "created",
            EncoderState::StreamConfigured => "stream-configured",
            EncoderState::TagRendered => "tag-rendered",
            EncoderState::Encoding => "encoding",
            EncoderState::Finished => "finished",
        }
    }
}

impl Display for EncoderState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

pub type EncoderResult<T> = Result<T, EncoderError>;

/// Drives an [`Mp3Codec`] and lays its output out in an [`OutputSink`].
#[derive(Debug)]
pub struct Mp3Encoder<C: Mp3Codec> {
    codec: C,
    params: EncoderParams,
    state: EncoderState,
    stream: Option<StreamParams>,
    tag: Id3Tag,
    /// Rendered ID3v2 size, known from `render_tag` on
    id3_size: usize,
    /// Encoded audio appended so far
    audio_bytes: usize,
}

impl<C: Mp3Codec> Mp3Encoder<C> {
    /// Configure `codec` for `params` and tag the output with this crate's name.
    pub fn create(mut codec: C, params: EncoderParams) -> Self {
        codec.apply_mode(params.mode, params.bitrate_kbps, params.quality);
        codec.set_message_handler(Box::new(route_codec_message));

        let mut tag = Id3Tag::new();
        tag.set_text(MetaTag::Encoder, Some(env!("CARGO_PKG_NAME")));

        Mp3Encoder {
            codec,
            params,
            state: EncoderState::Created,
            stream: None,
            tag,
            id3_size: 0,
            audio_bytes: 0,
        }
    }

    /// Freeze the stream parameters and derive the track length tag.
    pub fn set_stream_params(&mut self, stream: StreamParams) -> EncoderResult<()> {
        self.expect_state("set stream parameters", &[EncoderState::Created])?;

        if stream.sample_rate == 0 || !(1..=2).contains(&stream.channels) {
            return Err(EncoderError::init_failed(format!(
                "unsupported stream: {}",
                stream
            )));
        }
        self.codec
            .init_params(&stream)
            .map_err(|e| EncoderError::init_failed(e.to_string()))?;

        if let Some(ms) = stream.duration_ms() {
            self.tag.set_text(MetaTag::TrackLength, Some(&ms.to_string()));
        }
        log::debug!("MP3 stream configured: {}", stream);

        self.stream = Some(stream);
        self.state = EncoderState::StreamConfigured;
        Ok(())
    }

    /// Add a text tag value. `None` is ignored.
    pub fn set_text_tag(&mut self, key: MetaTag, value: Option<&str>) -> EncoderResult<()> {
        self.expect_state("set a text tag", &Self::TAGGABLE)?;
        self.tag.set_text(key, value);
        Ok(())
    }

    /// Add a raw text tag value; invalid UTF-8 is dropped.
    pub fn set_text_tag_bytes(&mut self, key: MetaTag, value: &[u8]) -> EncoderResult<()> {
        self.expect_state("set a text tag", &Self::TAGGABLE)?;
        self.tag.set_text_bytes(key, value);
        Ok(())
    }

    /// Attach a picture as a new `APIC` frame.
    pub fn set_picture_tag(&mut self, picture: &Picture) -> EncoderResult<()> {
        self.expect_state("set a picture tag", &Self::TAGGABLE)?;
        let picture_type = u8::try_from(picture.type_code()).unwrap_or_else(|_| {
            log::debug!(
                "Picture type {} does not fit ID3, storing as 0",
                picture.type_code()
            );
            0
        });
        self.tag.add_picture(
            picture.mime_type(),
            picture_type,
            picture.description(),
            picture.data(),
        );
        Ok(())
    }

    /// Scale every sample by `10^(db / 20)`.
    pub fn set_gain_db(&mut self, db: f64) -> EncoderResult<()> {
        self.expect_state(
            "set gain",
            &[
                EncoderState::Created,
                EncoderState::StreamConfigured,
                EncoderState::TagRendered,
            ],
        )?;
        let scale = 10f64.powf(db / 20.0);
        log::debug!("Applying {:.2} dB gain (scale {:.4})", db, scale);
        self.codec.set_scale(scale as f32);
        Ok(())
    }

    /// Write the ID3v2 header tag and the anchored ID3v1 trailer.
    ///
    /// The predicted output length is `size_hint` if given, otherwise
    /// [`calculate_size`](Self::calculate_size). Returns the prediction.
    pub fn render_tag<S: OutputSink + ?Sized>(
        &mut self,
        out: &mut S,
        size_hint: Option<usize>,
    ) -> EncoderResult<usize> {
        self.expect_state("render the tag", &[EncoderState::StreamConfigured])?;

        let header = self.tag.render(HEADER_TAG_PADDING)?;
        let trailer = render_v1(&self.tag)?;

        out.append(&header)?;
        out.write_from_end(&trailer, 0)?;
        self.id3_size = header.len();

        let predicted = size_hint.unwrap_or_else(|| self.calculate_size());
        out.set_predicted_length(predicted);

        self.state = EncoderState::TagRendered;
        Ok(predicted)
    }

    /// Encode one block of right-aligned PCM and append the result.
    pub fn encode_pcm_block<S: OutputSink + ?Sized>(
        &mut self,
        out: &mut S,
        block: &PcmBlock,
    ) -> EncoderResult<usize> {
        self.expect_state(
            "encode audio",
            &[EncoderState::TagRendered, EncoderState::Encoding],
        )?;

        let channels = self.stream.map_or(0, |s| s.channels);
        if block.num_channels() != channels as usize {
            return Err(EncoderError::ChannelMismatch {
                expected: channels,
                found: block.num_channels(),
            });
        }
        let bits = block.bits_per_sample();
        if !(1..=CODEC_SAMPLE_BITS).contains(&bits) {
            return Err(EncoderError::InvalidBitDepth(bits));
        }
        let shift = CODEC_SAMPLE_BITS - bits;

        let widen = |index: usize| -> Vec<i32> {
            block
                .channel(index)
                .map(|samples| samples.iter().map(|&s| s << shift).collect())
                .unwrap_or_default()
        };
        let left = widen(0);
        let right = if channels == 2 { widen(1) } else { left.clone() };

        let mut encoded = vec![0u8; encode_buffer_size(left.len())];
        let written = self
            .codec
            .encode(&left, &right, &mut encoded)
            .map_err(|failure| EncoderError::EncodeFailed(failure.0))?;

        out.append(&encoded[..written])?;
        self.audio_bytes += written;
        self.state = EncoderState::Encoding;
        Ok(written)
    }

    /// Flush the codec and patch the VBR summary frame.
    ///
    /// Returns the exact output length: header tag, audio, and trailer.
    pub fn finish<S: OutputSink + ?Sized>(&mut self, out: &mut S) -> EncoderResult<usize> {
        self.expect_state(
            "finish",
            &[EncoderState::TagRendered, EncoderState::Encoding],
        )?;

        let mut flushed = vec![0u8; encode_buffer_size(0)];
        let written = self
            .codec
            .flush(&mut flushed)
            .map_err(|failure| EncoderError::EncodeFailed(failure.0))?;
        out.append(&flushed[..written])?;
        self.audio_bytes += written;

        if self.params.mode.is_vbr() {
            let mut summary = vec![0u8; MAX_VBR_FRAME_SIZE];
            let size = self.codec.lametag_frame(&mut summary);
            if size > MAX_VBR_FRAME_SIZE {
                return Err(EncoderError::finalize_failed(format!(
                    "VBR summary frame of {} bytes exceeds {} reserved",
                    size, MAX_VBR_FRAME_SIZE
                )));
            }
            out.write_at(self.id3_size, &summary[..size])?;
        }

        self.state = EncoderState::Finished;
        let exact = self.id3_size + self.audio_bytes + ID3V1_TAG_LEN;
        log::debug!("MP3 encoding finished, {} bytes", exact);
        Ok(exact)
    }

    /// Estimate the output length from the codec's frame count.
    ///
    /// Only meaningful once the stream is configured and the header tag has
    /// been rendered.
    pub fn calculate_size(&self) -> usize {
        estimate_size(&SizeInputs {
            mode: self.params.mode,
            bitrate_kbps: self.params.bitrate_kbps,
            header_len: self.id3_size,
            total_frames: self.codec.total_frames(),
            in_sample_rate: self.codec.in_sample_rate(),
            out_sample_rate: self.codec.out_sample_rate(),
        })
    }

    pub const fn state(&self) -> EncoderState {
        self.state
    }

    pub const fn params(&self) -> &EncoderParams {
        &self.params
    }

    pub const fn stream_params(&self) -> Option<StreamParams> {
        self.stream
    }

    pub const fn tag(&self) -> &Id3Tag {
        &self.tag
    }

    /// Rendered header tag size; zero before `render_tag`.
    pub const fn id3_size(&self) -> usize {
        self.id3_size
    }

    pub const fn audio_bytes(&self) -> usize {
        self.audio_bytes
    }

    pub fn into_codec(self) -> C {
        self.codec
    }

    const TAGGABLE: [EncoderState; 2] = [EncoderState::Created, EncoderState::StreamConfigured];

    fn expect_state(&self, operation: &'static str, allowed: &[EncoderState]) -> EncoderResult<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(EncoderError::precondition(operation, self.state.as_str()))
        }
    }
}
