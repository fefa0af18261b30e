/// Message processing pipeline
///
/// This module turns one inbound message into a translated text reply and a
/// spoken Jangaloga rendition. It drives the external collaborators in a
/// fixed order and is the only place that knows how their failures map to
/// replies.
///
/// # Overview
///
/// A message moves through these stages:
///
/// 1. **Received** - size limits and configuration checks, then the global
///    [`ExclusiveSlot`] is tried; a held slot means an immediate "busy" reply
/// 2. **Prepared** - voice only: download and normalize to 16 kHz mono WAV
/// 3. **Transcribed** - voice only: speech recognition
/// 4. **Translated** - dictionary translation; the text reply is sent here
/// 5. **Synthesized** - voice cloning, optional tempo change, Opus encoding
/// 6. **Delivered** - voice note with retries, generic audio as fallback
///
/// Temporary files belong to a [`Session`] and disappear on every exit path.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::new(config, translator, engines, channel, ExclusiveSlot::new());
/// let outcome = pipeline
///     .process(Inbound::text(chat_id, "Привет!"))
///     .await;
/// ```
pub mod collaborators;
pub mod engine;
pub mod messages;
pub mod mock;
pub mod retry;
pub mod session;
pub mod slot;
pub mod transcode;


pub use collaborators::{
    ChatId, DeliveryChannel, DeliveryError, MessageId, SpeechRecognizer, SpeechSynthesizer,
    Transcoder,
};
pub use engine::LazyEngine;
pub use retry::RetryPolicy;
pub use session::Session;
pub use slot::{ExclusiveSlot, SlotGuard};

use crate::error::JgResult;
use crate::translator::{Translator, has_letters};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Received,
    Prepared,
    Transcribed,
    Translated,
    Synthesized,
    Delivered,
}

/// How the audio reached the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    VoiceNote,
    Audio,
}

/// Final state of one processed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Text and audio both delivered
    Delivered(DeliveryMode),
    /// Another message holds the pipeline slot
    Busy,
    /// Text or voice above the configured limits
    InputTooLong,
    /// Recognition produced no text
    RecognitionEmpty,
    /// Recognized text above the character budget
    RecognitionTooLong { chars: usize },
    /// The translation contains no letters
    TranslationEmpty,
    /// Text delivered, every audio delivery attempt failed
    DeliveryFailed,
    /// Aborted before reaching the given stage
    Failed(Stage),
}

/// What the user sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    Text(String),
    Voice {
        file_id: String,
        duration_secs: Option<u32>,
    },
}

/// One inbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub chat_id: ChatId,
    pub kind: InboundKind,
}

impl Inbound {
    pub fn text(chat_id: ChatId, text: &str) -> Self {
        Self {
            chat_id,
            kind: InboundKind::Text(text.to_string()),
        }
    }

    pub fn voice(chat_id: ChatId, file_id: &str, duration_secs: Option<u32>) -> Self {
        Self {
            chat_id,
            kind: InboundKind::Voice {
                file_id: file_id.to_string(),
                duration_secs,
            },
        }
    }
}

/// Tunables of the pipeline
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Language hint for recognition and synthesis
    pub language: String,
    /// Reference voice sample for cloning
    pub speaker_wav: PathBuf,
    /// Directory for session files
    pub temp_dir: PathBuf,
    /// `atempo` factor; 1.0 leaves speed unchanged
    pub speech_tempo: f32,
    pub max_text_chars: usize,
    pub max_voice_seconds: u32,
    pub sample_rate: u32,
    /// Network timeout of each audio upload attempt
    pub delivery_timeout: Duration,
    pub voice_retry: RetryPolicy,
    pub audio_retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            language: "ru".to_string(),
            speaker_wav: PathBuf::from("speaker.wav"),
            temp_dir: std::env::temp_dir().join("jangaloga"),
            speech_tempo: 0.67,
            max_text_chars: 400,
            max_voice_seconds: 45,
            sample_rate: transcode::ASR_SAMPLE_RATE,
            delivery_timeout: Duration::from_secs(180),
            voice_retry: RetryPolicy::new(3, Duration::from_secs(2)),
            audio_retry: RetryPolicy::new(2, Duration::from_secs(2)),
        }
    }
}

/// Speech and audio collaborators
#[derive(Clone)]
pub struct Engines {
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub transcoder: Arc<dyn Transcoder>,
}

/// Final audio file and whether it is a voice-note compatible encoding
struct PreparedAudio {
    path: PathBuf,
    voice_ready: bool,
}

/// Single-flight message pipeline
pub struct Pipeline {
    config: PipelineConfig,
    translator: Translator,
    engines: Engines,
    channel: Arc<dyn DeliveryChannel>,
    slot: ExclusiveSlot,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        translator: Translator,
        engines: Engines,
        channel: Arc<dyn DeliveryChannel>,
        slot: ExclusiveSlot,
    ) -> Self {
        Self {
            config,
            translator,
            engines,
            channel,
            slot,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn slot(&self) -> &ExclusiveSlot {
        &self.slot
    }

    /// Process one message to completion
    ///
    /// Never returns an error: every failure becomes a reply to the user and
    /// an [`Outcome`].
    pub async fn process(&self, inbound: Inbound) -> Outcome {
        let chat = inbound.chat_id;
        let outcome = match inbound.kind {
            InboundKind::Text(text) => self.process_text(chat, &text).await,
            InboundKind::Voice {
                file_id,
                duration_secs,
            } => self.process_voice(chat, &file_id, duration_secs).await,
        };
        info!(chat_id = chat, outcome = ?outcome, "Message processed");
        outcome
    }

    async fn process_text(&self, chat: ChatId, text: &str) -> Outcome {
        let text = text.trim();
        let chars = text.chars().count();
        if chars > self.config.max_text_chars {
            self.notify(chat, &messages::text_too_long(chars, self.config.max_text_chars))
                .await;
            return Outcome::InputTooLong;
        }
        if !self.speaker_available(chat).await {
            return Outcome::Failed(Stage::Prepared);
        }

        let Some(translation) = self.translate(text) else {
            self.notify(chat, messages::CANNOT_TRANSLATE_TEXT).await;
            return Outcome::TranslationEmpty;
        };

        let Some(_guard) = self.slot.try_acquire() else {
            info!(chat_id = chat, "Pipeline busy, sending text only");
            self.notify(chat, &messages::busy_with_translation(&translation))
                .await;
            return Outcome::Busy;
        };

        if let Err(e) = self.channel.send_text(chat, &translation).await {
            error!(chat_id = chat, error = %e, "Failed to send translation");
            return Outcome::Failed(Stage::Delivered);
        }
        let mut session = match Session::new(&self.config.temp_dir) {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Cannot open session directory");
                self.notify(chat, messages::AUDIO_FAILED).await;
                return Outcome::Failed(Stage::Synthesized);
            }
        };
        self.speak_and_send(chat, &translation, &mut session).await
    }

    async fn process_voice(
        &self,
        chat: ChatId,
        file_id: &str,
        duration_secs: Option<u32>,
    ) -> Outcome {
        if let Some(seconds) = duration_secs {
            if seconds > self.config.max_voice_seconds {
                self.notify(
                    chat,
                    &messages::voice_too_long(seconds, self.config.max_voice_seconds),
                )
                .await;
                return Outcome::InputTooLong;
            }
        }
        if !self.speaker_available(chat).await {
            return Outcome::Failed(Stage::Prepared);
        }
        if !self.engines.transcoder.is_available() {
            warn!(chat_id = chat, "Voice message rejected, transcoder unavailable");
            self.notify(chat, messages::VOICE_UNSUPPORTED).await;
            return Outcome::Failed(Stage::Prepared);
        }

        let Some(_guard) = self.slot.try_acquire() else {
            info!(chat_id = chat, "Pipeline busy, rejecting voice message");
            self.notify(chat, messages::BUSY).await;
            return Outcome::Busy;
        };

        let mut session = match Session::new(&self.config.temp_dir) {
            Ok(session) => session,
            Err(e) => {
                error!(error = %e, "Cannot open session directory");
                self.notify(chat, messages::PROCESSING_FAILED).await;
                return Outcome::Failed(Stage::Prepared);
            }
        };

        let wav = match self.prepare_voice(file_id, &mut session).await {
            Ok(wav) => wav,
            Err(e) => {
                error!(chat_id = chat, error = %e, "Voice preparation failed");
                self.notify(chat, messages::PROCESSING_FAILED).await;
                return Outcome::Failed(Stage::Prepared);
            }
        };
        debug!(chat_id = chat, stage = ?Stage::Prepared, "Voice normalized");

        let status = self.notify(chat, messages::RECOGNIZING).await;
        let recognized = match self
            .engines
            .recognizer
            .transcribe(&wav, &self.config.language)
            .await
        {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                error!(chat_id = chat, engine = self.engines.recognizer.engine_name(), error = %e, "Recognition failed");
                self.clear_status(chat, status).await;
                self.notify(chat, messages::PROCESSING_FAILED).await;
                return Outcome::Failed(Stage::Transcribed);
            }
        };

        if recognized.is_empty() {
            self.set_status(chat, status, messages::NOT_RECOGNIZED).await;
            return Outcome::RecognitionEmpty;
        }
        let chars = recognized.chars().count();
        if chars > self.config.max_text_chars {
            self.clear_status(chat, status).await;
            self.notify(
                chat,
                &messages::recognized_too_long(chars, self.config.max_text_chars),
            )
            .await;
            return Outcome::RecognitionTooLong { chars };
        }
        debug!(chat_id = chat, stage = ?Stage::Transcribed, chars, "Speech recognized");

        let status = self.set_status(chat, status, messages::TRANSLATING).await;
        let Some(translation) = self.translate(&recognized) else {
            self.clear_status(chat, status).await;
            self.notify(chat, messages::CANNOT_TRANSLATE_VOICE).await;
            return Outcome::TranslationEmpty;
        };
        self.clear_status(chat, status).await;

        if let Err(e) = self.channel.send_text(chat, &translation).await {
            error!(chat_id = chat, error = %e, "Failed to send translation");
            return Outcome::Failed(Stage::Delivered);
        }
        self.speak_and_send(chat, &translation, &mut session).await
    }

    /// Download the voice message and normalize it for recognition
    async fn prepare_voice(&self, file_id: &str, session: &mut Session) -> JgResult<PathBuf> {
        let input = session.file("input", ".ogg")?;
        self.channel
            .download(file_id, &input)
            .await
            .map_err(|e| crate::error::JgError::Network(e.to_string()))?;

        let wav = session.file("normalized", ".wav")?;
        self.engines
            .transcoder
            .convert(
                &input,
                &wav,
                &transcode::normalize_args(self.config.sample_rate),
            )
            .await?;
        Ok(wav)
    }

    /// Translate, returning `None` when the result has no letters
    fn translate(&self, text: &str) -> Option<String> {
        let translation = self.translator.translate_detailed(text);
        debug!(
            resolved = translation.resolved,
            unresolved = translation.unresolved,
            stage = ?Stage::Translated,
            "Translated"
        );
        has_letters(&translation.text).then_some(translation.text)
    }

    async fn speak_and_send(
        &self,
        chat: ChatId,
        translation: &str,
        session: &mut Session,
    ) -> Outcome {
        let status = self.notify(chat, messages::VOICING).await;
        let prepared = self.synthesize(translation, session).await;
        self.clear_status(chat, status).await;

        let audio = match prepared {
            Ok(audio) => audio,
            Err(e) => {
                error!(chat_id = chat, error = %e, "Synthesis failed");
                self.notify(chat, messages::AUDIO_FAILED).await;
                return Outcome::Failed(Stage::Synthesized);
            }
        };
        debug!(chat_id = chat, stage = ?Stage::Synthesized, path = %audio.path.display(), "Audio ready");

        match self.deliver(chat, &audio.path, audio.voice_ready).await {
            Some(mode) => {
                debug!(chat_id = chat, stage = ?Stage::Delivered, mode = ?mode, "Audio delivered");
                Outcome::Delivered(mode)
            }
            None => {
                self.notify(chat, messages::AUDIO_FAILED).await;
                Outcome::DeliveryFailed
            }
        }
    }

    /// Synthesize, adjust tempo and encode the reply audio
    async fn synthesize(&self, text: &str, session: &mut Session) -> JgResult<PreparedAudio> {
        let synthesized = session.file("synth", ".wav")?;
        self.engines
            .synthesizer
            .synthesize(
                text,
                &self.config.speaker_wav,
                &self.config.language,
                &synthesized,
            )
            .await?;

        let transcoder = &self.engines.transcoder;
        if !transcoder.is_available() {
            warn!("Transcoder unavailable, sending synthesized WAV as audio");
            return Ok(PreparedAudio {
                path: synthesized,
                voice_ready: false,
            });
        }

        let mut source = synthesized;
        if transcode::needs_tempo(self.config.speech_tempo) {
            let slowed = session.file("tempo", ".wav")?;
            debug!(tempo = self.config.speech_tempo, "Applying tempo");
            transcoder
                .convert(
                    &source,
                    &slowed,
                    &transcode::tempo_args(self.config.speech_tempo),
                )
                .await?;
            source = slowed;
        }

        let encoded = session.file("voice", ".ogg")?;
        transcoder
            .convert(&source, &encoded, &transcode::voice_encode_args())
            .await?;
        let bytes = std::fs::metadata(&encoded).map(|m| m.len()).unwrap_or(0);
        info!(bytes, "Encoded voice note");

        Ok(PreparedAudio {
            path: encoded,
            voice_ready: true,
        })
    }

    /// Voice note first, generic audio as the fallback
    async fn deliver(&self, chat: ChatId, audio: &Path, voice_ready: bool) -> Option<DeliveryMode> {
        let timeout = self.config.delivery_timeout;
        let channel = &self.channel;

        if voice_ready {
            match self
                .config
                .voice_retry
                .run("voice", move |attempt| {
                    debug!(chat_id = chat, attempt, "Sending voice note");
                    channel.send_voice(chat, audio, timeout)
                })
                .await
            {
                Ok(_) => return Some(DeliveryMode::VoiceNote),
                Err(e) => warn!(chat_id = chat, error = %e, "Voice note failed, falling back to audio"),
            }
        }

        match self
            .config
            .audio_retry
            .run("audio", move |attempt| {
                debug!(chat_id = chat, attempt, "Sending audio");
                channel.send_audio(chat, audio, timeout)
            })
            .await
        {
            Ok(_) => Some(DeliveryMode::Audio),
            Err(e) => {
                error!(chat_id = chat, error = %e, "Audio delivery failed");
                None
            }
        }
    }

    async fn speaker_available(&self, chat: ChatId) -> bool {
        if self.config.speaker_wav.exists() {
            return true;
        }
        error!(path = %self.config.speaker_wav.display(), "Reference voice sample missing");
        self.notify(chat, &messages::missing_speaker(&self.config.speaker_wav))
            .await;
        false
    }

    /// Send a message, logging instead of failing
    async fn notify(&self, chat: ChatId, text: &str) -> Option<MessageId> {
        match self.channel.send_text(chat, text).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(chat_id = chat, error = %e, "Failed to send message");
                None
            }
        }
    }

    /// Replace the status message text, or send a new one
    async fn set_status(
        &self,
        chat: ChatId,
        status: Option<MessageId>,
        text: &str,
    ) -> Option<MessageId> {
        if let Some(id) = status {
            match self.channel.edit_text(chat, id, text).await {
                Ok(()) => return Some(id),
                Err(e) => warn!(chat_id = chat, error = %e, "Failed to edit status"),
            }
        }
        self.notify(chat, text).await
    }

    async fn clear_status(&self, chat: ChatId, status: Option<MessageId>) {
        if let Some(id) = status {
            if let Err(e) = self.channel.delete_message(chat, id).await {
                warn!(chat_id = chat, error = %e, "Failed to delete status");
            }
        }
    }
}
