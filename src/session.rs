//! Per-file transcoding session.
//!
//! A [`TranscodeSession`] owns the decoder, encoder and output buffer for one
//! open source file. Opening a session configures the encoder and writes the
//! tags on the caller's thread; a producer thread then runs the decode/encode
//! loop while any number of readers call [`read`](TranscodeSession::read).
//!
//! Readers never see bytes that have not been produced: a read for a range not
//! yet available waits until the producer reaches it, finishes, or fails.

use std::{
    sync::{
        Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard,
        RwLockWriteGuard,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
};

use crate::{
    buffer::{BufferError, TranscodeBuffer},
    error::{TranscodeError, TranscodeResult},
    flac::picture::Picture,
    mp3::{Mp3Codec, Mp3Encoder},
    traits::{Decoder, OutputSink, SizeCache, SourceKey},
    types::EncoderParams,
};

/// Where the producer thread has got to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    /// Output complete; the buffer holds exactly this many bytes
    Finished(usize),
    Failed(String),
    Cancelled,
}

impl SessionStatus {
    pub const fn is_running(&self) -> bool {
        matches!(self, SessionStatus::Running)
    }
}

// Locks guard state that is updated in a single step, so a poisoned lock still
// holds consistent data and is recovered rather than propagated.

#[derive(Debug)]
struct Shared {
    buffer: RwLock<TranscodeBuffer>,
    status: Mutex<SessionStatus>,
    /// Signalled under `status` after every change to the buffer or status
    produced: Condvar,
    cancelled: AtomicBool,
}

impl Shared {
    fn read_buffer(&self) -> RwLockReadGuard<'_, TranscodeBuffer> {
        self.buffer.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_buffer(&self) -> RwLockWriteGuard<'_, TranscodeBuffer> {
        self.buffer.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_status(&self) -> MutexGuard<'_, SessionStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        let _status = self.lock_status();
        self.produced.notify_all();
    }

    fn set_status(&self, status: SessionStatus) {
        let mut current = self.lock_status();
        *current = status;
        self.produced.notify_all();
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Encoder output sink that locks the shared buffer per write and wakes
/// waiting readers afterwards.
struct SharedSink<'a>(&'a Shared);

impl OutputSink for SharedSink<'_> {
    fn append(&mut self, bytes: &[u8]) -> Result<(), BufferError> {
        self.0.write_buffer().append(bytes)?;
        self.0.notify();
        Ok(())
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<(), BufferError> {
        self.0.write_buffer().write_at(offset, bytes)?;
        self.0.notify();
        Ok(())
    }

    fn write_from_end(&mut self, bytes: &[u8], distance: usize) -> Result<(), BufferError> {
        self.0.write_buffer().write_from_end(bytes, distance)
    }

    fn set_predicted_length(&mut self, predicted: usize) {
        self.0.write_buffer().set_predicted_length(predicted);
    }
}

/// One open transcoded file.
#[derive(Debug)]
pub struct TranscodeSession {
    key: SourceKey,
    shared: Arc<Shared>,
    producer: Option<JoinHandle<()>>,
}

impl TranscodeSession {
    /// Configure an encoder from `decoder`, write the tags and start producing.
    ///
    /// A size recorded in `cache` for `key` is used as the advertised size;
    /// otherwise the encoder's estimate is. Malformed embedded pictures are
    /// skipped. Every other configuration error fails the open.
    pub fn open<D, C>(
        key: SourceKey,
        decoder: D,
        codec: C,
        params: EncoderParams,
        cache: Option<Arc<dyn SizeCache>>,
    ) -> TranscodeResult<Self>
    where
        D: Decoder + 'static,
        C: Mp3Codec + 'static,
    {
        let stream = decoder.stream_params();
        log::debug!("Opening transcode of '{}' ({})", key, stream);

        let mut encoder = Mp3Encoder::create(codec, params);
        encoder.set_stream_params(stream)?;

        for (tag, value) in decoder.tags() {
            encoder.set_text_tag_bytes(tag, &value)?;
        }
        for block in decoder.pictures() {
            match Picture::decode(&block) {
                Ok(picture) => encoder.set_picture_tag(&picture)?,
                Err(e) => log::warn!("Skipping embedded picture in '{}': {}", key, e),
            }
        }
        if let Some(db) = params.gain_db(&decoder.replay_gain()) {
            encoder.set_gain_db(db)?;
        }

        let hint = cache
            .as_ref()
            .and_then(|cache| cache.lookup(&key))
            .and_then(|size| usize::try_from(size).ok());

        let mut buffer = TranscodeBuffer::new();
        let predicted = encoder.render_tag(&mut buffer, hint)?;
        log::debug!(
            "Predicted size of '{}' is {} bytes{}",
            key,
            predicted,
            if hint.is_some() { " (cached)" } else { "" }
        );

        let shared = Arc::new(Shared {
            buffer: RwLock::new(buffer),
            status: Mutex::new(SessionStatus::Running),
            produced: Condvar::new(),
            cancelled: AtomicBool::new(false),
        });

        let producer = {
            let shared = Arc::clone(&shared);
            let key = key.clone();
            thread::Builder::new()
                .name(format!("transcode {}", key))
                .spawn(move || produce(&shared, &key, decoder, encoder, cache))?
        };

        Ok(TranscodeSession {
            key,
            shared,
            producer: Some(producer),
        })
    }

    /// Read up to `len` bytes at `offset`, waiting for them to be produced.
    ///
    /// Once the output is complete, reads are clipped to its final length.
    /// Fails if the producer failed or the session was cancelled before the
    /// range became available.
    pub fn read(&self, offset: usize, len: usize) -> TranscodeResult<Vec<u8>> {
        let end = offset.saturating_add(len);
        let mut status = self.shared.lock_status();
        loop {
            match &*status {
                SessionStatus::Finished(_) => {
                    return Ok(self.shared.read_buffer().read_at(offset, len).to_vec());
                }
                SessionStatus::Failed(message) => {
                    return Err(TranscodeError::aborted(message.clone()));
                }
                SessionStatus::Cancelled => return Err(TranscodeError::Cancelled),
                SessionStatus::Running => {
                    {
                        let buffer = self.shared.read_buffer();
                        if buffer.len() >= end {
                            return Ok(buffer.read_at(offset, len).to_vec());
                        }
                    }
                    if self.shared.is_cancelled() {
                        return Err(TranscodeError::Cancelled);
                    }
                }
            }
            status = self
                .shared
                .produced
                .wait(status)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Size to advertise: exact once finished, predicted until then.
    pub fn size(&self) -> usize {
        self.shared.read_buffer().reported_size()
    }

    /// Bytes produced so far.
    pub fn produced(&self) -> usize {
        self.shared.read_buffer().len()
    }

    /// Size advertised when the session was opened.
    pub fn predicted_length(&self) -> Option<usize> {
        self.shared.read_buffer().predicted_length()
    }

    /// Committed final length, once the output is complete.
    pub fn final_length(&self) -> Option<usize> {
        self.shared.read_buffer().final_length()
    }

    pub fn status(&self) -> SessionStatus {
        self.shared.lock_status().clone()
    }

    pub const fn key(&self) -> &SourceKey {
        &self.key
    }

    /// Block until the producer stops, returning the exact output size.
    pub fn wait(&self) -> TranscodeResult<usize> {
        let mut status = self.shared.lock_status();
        loop {
            match &*status {
                SessionStatus::Running => {}
                SessionStatus::Finished(size) => return Ok(*size),
                SessionStatus::Failed(message) => {
                    return Err(TranscodeError::aborted(message.clone()));
                }
                SessionStatus::Cancelled => return Err(TranscodeError::Cancelled),
            }
            status = self
                .shared
                .produced
                .wait(status)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Ask the producer to stop after the block it is working on. Returns
    /// immediately; finishing steps are never run for a cancelled session.
    pub fn cancel(&self) {
        if self.shared.lock_status().is_running() {
            log::debug!("Cancelling transcode of '{}'", self.key);
        }
        self.shared.cancelled.store(true, Ordering::Release);
        self.shared.notify();
    }

    /// Cancel (if still running) and wait for the producer thread to exit.
    pub fn close(mut self) -> TranscodeResult<()> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> TranscodeResult<()> {
        let Some(producer) = self.producer.take() else {
            return Ok(());
        };
        if self.shared.lock_status().is_running() {
            self.cancel();
        }
        producer
            .join()
            .map_err(|_| TranscodeError::aborted("transcode producer panicked"))
    }
}

impl Drop for TranscodeSession {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            log::error!("Closing transcode of '{}': {}", self.key, e);
        }
    }
}

fn produce<D: Decoder, C: Mp3Codec>(
    shared: &Shared,
    key: &SourceKey,
    mut decoder: D,
    mut encoder: Mp3Encoder<C>,
    cache: Option<Arc<dyn SizeCache>>,
) {
    let status = match encode_all(shared, &mut decoder, &mut encoder) {
        Ok(exact) => match commit(shared, key, exact, cache.as_deref()) {
            Ok(()) => {
                log::debug!("Finished transcode of '{}', {} bytes", key, exact);
                SessionStatus::Finished(exact)
            }
            Err(e) => {
                log::error!("Failed to commit transcode of '{}': {}", key, e);
                SessionStatus::Failed(e.to_string())
            }
        },
        Err(TranscodeError::Cancelled) => {
            log::debug!("Transcode of '{}' cancelled", key);
            SessionStatus::Cancelled
        }
        Err(e) => {
            log::error!("Transcode of '{}' failed: {}", key, e);
            SessionStatus::Failed(e.to_string())
        }
    };
    shared.set_status(status);
}

fn encode_all<D: Decoder, C: Mp3Codec>(
    shared: &Shared,
    decoder: &mut D,
    encoder: &mut Mp3Encoder<C>,
) -> TranscodeResult<usize> {
    let mut sink = SharedSink(shared);
    loop {
        if shared.is_cancelled() {
            return Err(TranscodeError::Cancelled);
        }
        let block = decoder.next_pcm_block()?;
        // the decoder may have blocked; look again before acting on its result
        if shared.is_cancelled() {
            return Err(TranscodeError::Cancelled);
        }
        match block {
            Some(block) => {
                encoder.encode_pcm_block(&mut sink, &block)?;
            }
            None => break,
        }
    }
    Ok(encoder.finish(&mut sink)?)
}

/// Seal the buffer at its exact length, then record that length.
fn commit(
    shared: &Shared,
    key: &SourceKey,
    exact: usize,
    cache: Option<&dyn SizeCache>,
) -> TranscodeResult<()> {
    shared.write_buffer().set_final_length(exact)?;
    if let Some(cache) = cache {
        cache.store(key, exact as u64, shared.read_buffer().as_bytes());
    }
    Ok(())
}
