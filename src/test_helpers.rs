//! Deterministic collaborators for unit tests.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
    mpsc::Receiver,
};

use crate::error::{TranscodeError, TranscodeResult};
use crate::mp3::codec::{CodecError, CodecFailure, MessageHandler, MessageLevel, Mp3Codec};
use crate::mp3::constants::{MAX_VBR_FRAME_SIZE, SAMPLES_PER_FRAME};
use crate::traits::{Decoder, SizeCache, SourceKey};
use crate::types::{BitrateMode, MetaTag, PcmBlock, ReplayGain, StreamParams};

/// Call counters shared between a [`FakeCodec`] and the test that owns it.
#[derive(Debug, Default)]
pub struct CodecCounters {
    pub encode_calls: AtomicUsize,
    pub flush_calls: AtomicUsize,
    pub lametag_calls: AtomicUsize,
}

impl CodecCounters {
    pub fn encodes(&self) -> usize {
        self.encode_calls.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.flush_calls.load(Ordering::SeqCst)
    }

    pub fn lametags(&self) -> usize {
        self.lametag_calls.load(Ordering::SeqCst)
    }
}

/// A codec that emits one [`AUDIO_BYTE`](Self::AUDIO_BYTE) per 8 input
/// samples. In VBR mode the first encode call is preceded by a zeroed
/// placeholder for the summary frame.
#[derive(Debug, Default)]
pub struct FakeCodec {
    mode: BitrateMode,
    stream: Option<StreamParams>,
    scale: f32,
    has_handler: bool,
    placeholder_written: bool,
    reject_init: bool,
    encode_failure: Option<i32>,
    summary_size: Option<usize>,
    last_left: Vec<i32>,
    last_right: Vec<i32>,
    counters: Arc<CodecCounters>,
}

impl FakeCodec {
    pub const AUDIO_BYTE: u8 = 0xAA;
    pub const FLUSH_LEN: usize = 16;
    pub const SUMMARY_LEN: usize = 208;

    pub fn new() -> Self {
        FakeCodec {
            scale: 1.0,
            ..Self::default()
        }
    }

    pub fn rejecting() -> Self {
        FakeCodec {
            reject_init: true,
            ..Self::new()
        }
    }

    pub fn failing_encode(code: i32) -> Self {
        FakeCodec {
            encode_failure: Some(code),
            ..Self::new()
        }
    }

    pub fn oversized_summary() -> Self {
        FakeCodec {
            summary_size: Some(MAX_VBR_FRAME_SIZE + 1),
            ..Self::new()
        }
    }

    /// Bytes written by `lametag_frame`.
    pub fn summary_frame() -> Vec<u8> {
        (0..Self::SUMMARY_LEN).map(|i| (i % 251) as u8 + 1).collect()
    }

    pub fn counters(&self) -> Arc<CodecCounters> {
        Arc::clone(&self.counters)
    }

    pub fn last_left(&self) -> Vec<i32> {
        self.last_left.clone()
    }

    pub fn last_right(&self) -> Vec<i32> {
        self.last_right.clone()
    }

    pub const fn scale(&self) -> f32 {
        self.scale
    }

    pub const fn has_handler(&self) -> bool {
        self.has_handler
    }

    /// Bytes produced for `samples` samples per channel.
    pub const fn encoded_len(samples: usize) -> usize {
        samples / 8
    }
}

impl Mp3Codec for FakeCodec {
    fn apply_mode(&mut self, mode: BitrateMode, _bitrate_kbps: u32, _quality: u8) {
        self.mode = mode;
    }

    fn set_message_handler(&mut self, handler: MessageHandler) {
        handler(MessageLevel::Debug, "fake codec ready");
        self.has_handler = true;
    }

    fn set_scale(&mut self, scale: f32) {
        self.scale = scale;
    }

    fn init_params(&mut self, params: &StreamParams) -> Result<(), CodecError> {
        if self.reject_init {
            return Err(CodecError(format!("unsupported rate {}", params.sample_rate)));
        }
        self.stream = Some(*params);
        Ok(())
    }

    fn total_frames(&self) -> u64 {
        self.stream
            .map_or(0, |s| s.total_samples.div_ceil(SAMPLES_PER_FRAME))
    }

    fn in_sample_rate(&self) -> u32 {
        self.stream.map_or(0, |s| s.sample_rate)
    }

    fn out_sample_rate(&self) -> u32 {
        self.in_sample_rate()
    }

    fn encode(&mut self, left: &[i32], right: &[i32], out: &mut [u8]) -> Result<usize, CodecFailure> {
        self.counters.encode_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = self.encode_failure {
            return Err(CodecFailure(code));
        }
        self.last_left = left.to_vec();
        self.last_right = right.to_vec();

        let mut written = 0;
        if self.mode.is_vbr() && !self.placeholder_written {
            out[..Self::SUMMARY_LEN].fill(0);
            written = Self::SUMMARY_LEN;
            self.placeholder_written = true;
        }
        let audio = Self::encoded_len(left.len());
        out[written..written + audio].fill(Self::AUDIO_BYTE);
        Ok(written + audio)
    }

    fn flush(&mut self, out: &mut [u8]) -> Result<usize, CodecFailure> {
        self.counters.flush_calls.fetch_add(1, Ordering::SeqCst);
        out[..Self::FLUSH_LEN].fill(Self::AUDIO_BYTE);
        Ok(Self::FLUSH_LEN)
    }

    fn lametag_frame(&mut self, out: &mut [u8]) -> usize {
        self.counters.lametag_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(size) = self.summary_size {
            return size;
        }
        let summary = Self::summary_frame();
        out[..summary.len()].copy_from_slice(&summary);
        summary.len()
    }
}

/// A decoder serving a fixed list of blocks.
///
/// With a gate attached, each block waits for one message on the gate before
/// it is returned; a closed gate ends the stream.
#[derive(Debug)]
pub struct ScriptedDecoder {
    params: StreamParams,
    blocks: Vec<PcmBlock>,
    next: usize,
    tags: Vec<(MetaTag, Vec<u8>)>,
    pictures: Vec<Vec<u8>>,
    gain: ReplayGain,
    gate: Option<Receiver<()>>,
    fail_at: Option<usize>,
}

impl ScriptedDecoder {
    /// Stereo 16-bit silence split into blocks of `block_len` samples.
    pub fn silence(params: StreamParams, block_len: usize) -> Self {
        let mut blocks = Vec::new();
        let mut remaining = params.total_samples as usize;
        while remaining > 0 {
            let len = remaining.min(block_len);
            let channels = vec![vec![0; len]; params.channels as usize];
            if let Some(block) = PcmBlock::from_channels(&channels, 16) {
                blocks.push(block);
            }
            remaining -= len;
        }
        ScriptedDecoder {
            params,
            blocks,
            next: 0,
            tags: Vec::new(),
            pictures: Vec::new(),
            gain: ReplayGain::default(),
            gate: None,
            fail_at: None,
        }
    }

    pub fn with_tag(mut self, key: MetaTag, value: &[u8]) -> Self {
        self.tags.push((key, value.to_vec()));
        self
    }

    pub fn with_picture(mut self, block: Vec<u8>) -> Self {
        self.pictures.push(block);
        self
    }

    pub fn with_gain(mut self, gain: ReplayGain) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_gate(mut self, gate: Receiver<()>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Fail with a decoder error instead of returning block `index`.
    pub fn failing_at(mut self, index: usize) -> Self {
        self.fail_at = Some(index);
        self
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl Decoder for ScriptedDecoder {
    fn stream_params(&self) -> StreamParams {
        self.params
    }

    fn next_pcm_block(&mut self) -> TranscodeResult<Option<PcmBlock>> {
        if self.next >= self.blocks.len() {
            return Ok(None);
        }
        if let Some(gate) = &self.gate {
            if gate.recv().is_err() {
                return Ok(None);
            }
        }
        if self.fail_at == Some(self.next) {
            return Err(TranscodeError::decoder("corrupt frame"));
        }
        let block = self.blocks[self.next].clone();
        self.next += 1;
        Ok(Some(block))
    }

    fn tags(&self) -> Vec<(MetaTag, Vec<u8>)> {
        self.tags.clone()
    }

    fn pictures(&self) -> Vec<Vec<u8>> {
        self.pictures.clone()
    }

    fn replay_gain(&self) -> ReplayGain {
        self.gain
    }
}

/// A size cache recording every store.
#[derive(Debug, Default)]
pub struct RecordingCache {
    pub sizes: Mutex<Vec<(SourceKey, u64, usize)>>,
    pub preset: Option<u64>,
}

impl RecordingCache {
    pub fn with_size(size: u64) -> Self {
        RecordingCache {
            preset: Some(size),
            ..Self::default()
        }
    }

    pub fn stores(&self) -> Vec<(SourceKey, u64, usize)> {
        self.sizes.lock().expect("cache lock poisoned").clone()
    }
}

impl SizeCache for RecordingCache {
    fn lookup(&self, _key: &SourceKey) -> Option<u64> {
        self.preset
    }

    fn store(&self, key: &SourceKey, size: u64, bytes: &[u8]) {
        self.sizes
            .lock()
            .expect("cache lock poisoned")
            .push((key.clone(), size, bytes.len()));
    }
}
