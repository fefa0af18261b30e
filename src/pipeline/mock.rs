//! Scripted collaborators for testing
//!
//! These fakes let the pipeline run end to end without speech engines,
//! ffmpeg or network access. Each one records how it was called so tests can
//! assert on the exact sequence of stages.
//!
//! # Example
//!
//! ```ignore
//! let channel = MockChannel::new();
//! channel.fail_voice(3, DeliveryError::Transient("timeout".into()));
//! // ... run the pipeline ...
//! assert_eq!(channel.audio_attempts(), 1);
//! ```

use crate::error::{JgError, JgResult};
use crate::pipeline::collaborators::{
    ChatId, DeliveryChannel, DeliveryError, MessageId, SpeechRecognizer, SpeechSynthesizer,
    Transcoder,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Recognizer returning a fixed transcript or a fixed failure
#[derive(Debug)]
pub struct MockRecognizer {
    reply: Result<String, String>,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn returning(transcript: &str) -> Self {
        Self {
            reply: Ok(transcript.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechRecognizer for MockRecognizer {
    async fn transcribe(&self, _wav: &Path, _language: &str) -> JgResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone().map_err(JgError::Stage)
    }

    fn engine_name(&self) -> &str {
        "Mock Recognizer"
    }
}

/// Synthesizer writing a tiny placeholder WAV
#[derive(Debug, Default)]
pub struct MockSynthesizer {
    failure: Option<String>,
    texts: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            texts: Mutex::new(Vec::new()),
        }
    }

    /// Texts passed to `synthesize`, in call order
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().map(|t| t.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        _speaker_wav: &Path,
        _language: &str,
        out_wav: &Path,
    ) -> JgResult<()> {
        if let Ok(mut texts) = self.texts.lock() {
            texts.push(text.to_string());
        }
        if let Some(message) = &self.failure {
            return Err(JgError::Stage(message.clone()));
        }
        fs::write(out_wav, b"RIFF\0\0\0\0WAVE")?;
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "Mock Synthesizer"
    }
}

/// One recorded transcoder invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertCall {
    pub input: PathBuf,
    pub output: PathBuf,
    pub args: Vec<String>,
}

/// Transcoder that copies its input to its output
#[derive(Debug)]
pub struct MockTranscoder {
    available: bool,
    failure: Option<String>,
    calls: Mutex<Vec<ConvertCall>>,
}

impl MockTranscoder {
    pub fn new() -> Self {
        Self {
            available: true,
            failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A transcoder that is not installed
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new()
        }
    }

    /// A transcoder whose every run fails
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn calls(&self) -> Vec<ConvertCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl Default for MockTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn convert(&self, input: &Path, output: &Path, args: &[String]) -> JgResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(ConvertCall {
                input: input.to_path_buf(),
                output: output.to_path_buf(),
                args: args.to_vec(),
            });
        }
        if let Some(message) = &self.failure {
            return Err(JgError::Stage(message.clone()));
        }
        fs::copy(input, output)?;
        Ok(())
    }
}

/// Everything the pipeline did on the channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Text(String),
    Edit(MessageId, String),
    Delete(MessageId),
    Voice { path: PathBuf, delivered: bool },
    Audio { path: PathBuf, delivered: bool },
    Download { file_id: String, path: PathBuf },
}

/// In-memory messaging channel with scripted delivery failures
#[derive(Debug, Default)]
pub struct MockChannel {
    events: Mutex<Vec<ChannelEvent>>,
    voice_failures: Mutex<VecDeque<DeliveryError>>,
    audio_failures: Mutex<VecDeque<DeliveryError>>,
    download_failure: Mutex<Option<DeliveryError>>,
    next_id: AtomicUsize,
    timeouts: Mutex<Vec<Duration>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` voice-note attempts fail with `error`
    pub fn fail_voice(&self, count: usize, error: DeliveryError) {
        if let Ok(mut queue) = self.voice_failures.lock() {
            queue.extend(std::iter::repeat_n(error, count));
        }
    }

    /// Make the next `count` generic-audio attempts fail with `error`
    pub fn fail_audio(&self, count: usize, error: DeliveryError) {
        if let Ok(mut queue) = self.audio_failures.lock() {
            queue.extend(std::iter::repeat_n(error, count));
        }
    }

    pub fn fail_download(&self, error: DeliveryError) {
        if let Ok(mut slot) = self.download_failure.lock() {
            *slot = Some(error);
        }
    }

    pub fn events(&self) -> Vec<ChannelEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Texts sent as new messages, in order
    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ChannelEvent::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn voice_attempts(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ChannelEvent::Voice { .. }))
            .count()
    }

    pub fn audio_attempts(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ChannelEvent::Audio { .. }))
            .count()
    }

    /// Timeouts passed to voice and audio sends
    pub fn timeouts(&self) -> Vec<Duration> {
        self.timeouts.lock().map(|t| t.clone()).unwrap_or_default()
    }

    fn record(&self, event: ChannelEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn next_failure(queue: &Mutex<VecDeque<DeliveryError>>) -> Option<DeliveryError> {
        queue.lock().ok().and_then(|mut q| q.pop_front())
    }
}

#[async_trait]
impl DeliveryChannel for MockChannel {
    async fn send_text(&self, _chat: ChatId, text: &str) -> Result<MessageId, DeliveryError> {
        self.record(ChannelEvent::Text(text.to_string()));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst) as MessageId + 1)
    }

    async fn edit_text(
        &self,
        _chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<(), DeliveryError> {
        self.record(ChannelEvent::Edit(message, text.to_string()));
        Ok(())
    }

    async fn delete_message(
        &self,
        _chat: ChatId,
        message: MessageId,
    ) -> Result<(), DeliveryError> {
        self.record(ChannelEvent::Delete(message));
        Ok(())
    }

    async fn send_voice(
        &self,
        _chat: ChatId,
        audio: &Path,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        if let Ok(mut timeouts) = self.timeouts.lock() {
            timeouts.push(timeout);
        }
        let failure = Self::next_failure(&self.voice_failures);
        self.record(ChannelEvent::Voice {
            path: audio.to_path_buf(),
            delivered: failure.is_none(),
        });
        match failure {
            Some(error) => Err(error),
            None if audio.exists() => Ok(()),
            None => Err(DeliveryError::Permanent("voice file missing".to_string())),
        }
    }

    async fn send_audio(
        &self,
        _chat: ChatId,
        audio: &Path,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        if let Ok(mut timeouts) = self.timeouts.lock() {
            timeouts.push(timeout);
        }
        let failure = Self::next_failure(&self.audio_failures);
        self.record(ChannelEvent::Audio {
            path: audio.to_path_buf(),
            delivered: failure.is_none(),
        });
        match failure {
            Some(error) => Err(error),
            None if audio.exists() => Ok(()),
            None => Err(DeliveryError::Permanent("audio file missing".to_string())),
        }
    }

    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), DeliveryError> {
        self.record(ChannelEvent::Download {
            file_id: file_id.to_string(),
            path: destination.to_path_buf(),
        });
        let failure = self.download_failure.lock().ok().and_then(|f| f.clone());
        if let Some(error) = failure {
            return Err(error);
        }
        fs::write(destination, b"OggS")
            .map_err(|e| DeliveryError::Permanent(format!("write failed: {}", e)))
    }
}
