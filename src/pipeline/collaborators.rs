//! Traits for the external collaborators driven by the pipeline
//!
//! The pipeline never talks to a speech engine, the transcoder or the
//! messaging platform directly. Concrete adapters live in the serving binary;
//! [`crate::pipeline::mock`] provides scripted fakes for tests.

use crate::error::JgResult;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Chat identifier on the messaging platform
pub type ChatId = i64;

/// Message identifier inside a chat
pub type MessageId = i64;

/// Speech recognition engine: normalized waveform in, plain text out
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe a 16 kHz mono PCM WAV file
    ///
    /// An empty string means nothing was recognized; it is not an error.
    async fn transcribe(&self, wav: &Path, language: &str) -> JgResult<String>;

    /// Name used in logs
    fn engine_name(&self) -> &str;
}

/// Voice-cloning synthesis engine
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Speak `text` in the voice of `speaker_wav`, writing a WAV to `out_wav`
    async fn synthesize(
        &self,
        text: &str,
        speaker_wav: &Path,
        language: &str,
        out_wav: &Path,
    ) -> JgResult<()>;

    fn engine_name(&self) -> &str;
}

/// Audio transcoder driven by a list of filter/encoding arguments
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Whether the transcoder can run at all, decided once at startup
    fn is_available(&self) -> bool;

    /// Convert `input` into `output`, overwriting it
    async fn convert(&self, input: &Path, output: &Path, args: &[String]) -> JgResult<()>;
}

/// Failure delivering something to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// Timeouts, dropped connections, rate limits and server errors
    Transient(String),
    /// The platform refused the request; retrying will not help
    Permanent(String),
}

impl DeliveryError {
    pub fn is_transient(&self) -> bool {
        matches!(self, DeliveryError::Transient(_))
    }
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Transient(msg) => write!(f, "Transient delivery failure: {}", msg),
            DeliveryError::Permanent(msg) => write!(f, "Delivery failure: {}", msg),
        }
    }
}

impl std::error::Error for DeliveryError {}

/// Messaging platform operations used by the pipeline
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<MessageId, DeliveryError>;

    async fn edit_text(
        &self,
        chat: ChatId,
        message: MessageId,
        text: &str,
    ) -> Result<(), DeliveryError>;

    async fn delete_message(&self, chat: ChatId, message: MessageId)
    -> Result<(), DeliveryError>;

    /// Send an Ogg/Opus file as a voice note
    async fn send_voice(
        &self,
        chat: ChatId,
        audio: &Path,
        timeout: Duration,
    ) -> Result<(), DeliveryError>;

    /// Send a file as a generic audio attachment
    async fn send_audio(
        &self,
        chat: ChatId,
        audio: &Path,
        timeout: Duration,
    ) -> Result<(), DeliveryError>;

    /// Download an inbound attachment to `destination`
    async fn download(&self, file_id: &str, destination: &Path) -> Result<(), DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_error_kinds() {
        assert!(DeliveryError::Transient("timeout".to_string()).is_transient());
        assert!(!DeliveryError::Permanent("forbidden".to_string()).is_transient());
    }

    #[test]
    fn test_delivery_error_display() {
        assert_eq!(
            DeliveryError::Transient("timeout".to_string()).to_string(),
            "Transient delivery failure: timeout"
        );
    }
}
