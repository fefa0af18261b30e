//! Environment configuration for the bot

use jangaloga::pipeline::{PipelineConfig, RetryPolicy};
use jangaloga::{JgError, JgResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_ASR_COMMAND: &str = "whisper-cli -l {language} -nt -np -f {input}";
pub const DEFAULT_TTS_COMMAND: &str =
    "tts --text {text} --speaker_wav {speaker} --language_idx {language} --out_path {output}";
pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

/// Validated bot settings
#[derive(Clone)]
pub struct AppConfig {
    pub bot_token: String,
    pub data_dir: PathBuf,
    pub dict_path: PathBuf,
    pub speaker_wav: PathBuf,
    /// `atempo` factor applied to synthesized speech
    pub speech_tempo: f32,
    /// Per-request timeout for uploads and long polling
    pub telegram_timeout: Duration,
    pub max_text_chars: usize,
    pub max_voice_seconds: u32,
    pub health_port: u16,
    /// Speech recognition command template
    pub asr_command: String,
    /// Voice-cloning synthesis command template
    pub tts_command: String,
    pub tts_language: String,
    pub lemma_table: Option<PathBuf>,
    pub ffmpeg: String,
    pub api_url: String,
}

/// Variables defined in a `.env` file; a missing file defines none
pub fn read_dotenv(path: &Path) -> JgResult<HashMap<String, String>> {
    let invalid = |e: dotenvy::Error| JgError::Config(format!("Invalid {}: {}", path.display(), e));
    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(invalid(e)),
    };
    entries.map(|entry| entry.map_err(invalid)).collect()
}

impl AppConfig {
    /// Read the configuration from the process environment
    ///
    /// Variables missing from the environment fall back to `dotenv`.
    pub fn from_env(dotenv: &HashMap<String, String>) -> JgResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Read the configuration through `lookup`
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    /// `JgError::Config` when `BOT_TOKEN` is missing, a number does not parse
    /// or a value is out of range.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> JgResult<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let text = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let bot_token = get("BOT_TOKEN")
            .ok_or_else(|| JgError::Config("BOT_TOKEN is not set".to_string()))?;

        let speech_tempo: f32 = parse_number("SPEECH_TEMPO", get("SPEECH_TEMPO"), 0.67)?;
        if !(0.5..=2.0).contains(&speech_tempo) {
            return Err(JgError::Config(
                "SPEECH_TEMPO must be within 0.5..2.0 (ffmpeg atempo)".to_string(),
            ));
        }

        let telegram_timeout: f64 =
            parse_number("TELEGRAM_TIMEOUT", get("TELEGRAM_TIMEOUT"), 180.0)?;
        if telegram_timeout < 30.0 {
            return Err(JgError::Config(
                "TELEGRAM_TIMEOUT must be at least 30 seconds".to_string(),
            ));
        }

        let max_text_chars: usize = parse_number("MAX_TEXT_CHARS", get("MAX_TEXT_CHARS"), 400)?;
        if max_text_chars < 50 {
            return Err(JgError::Config("MAX_TEXT_CHARS must be at least 50".to_string()));
        }

        let max_voice_seconds: u32 =
            parse_number("MAX_VOICE_SECONDS", get("MAX_VOICE_SECONDS"), 45)?;
        if max_voice_seconds < 5 {
            return Err(JgError::Config(
                "MAX_VOICE_SECONDS must be at least 5".to_string(),
            ));
        }

        // PORT wins: container platforms set it for readiness probes
        let health_port: u32 =
            parse_number("PORT/HEALTH_PORT", get("PORT").or_else(|| get("HEALTH_PORT")), 8080)?;
        let health_port = u16::try_from(health_port)
            .ok()
            .filter(|port| *port >= 1)
            .ok_or_else(|| {
                JgError::Config("PORT/HEALTH_PORT must be within 1..65535".to_string())
            })?;

        Ok(Self {
            bot_token,
            data_dir: PathBuf::from(text("DATA_DIR", "./tmp")),
            dict_path: PathBuf::from(text("DICT_PATH", "./dictionary.json")),
            speaker_wav: PathBuf::from(text("SPEAKER_WAV", "./speaker.wav")),
            speech_tempo,
            telegram_timeout: Duration::from_secs_f64(telegram_timeout),
            max_text_chars,
            max_voice_seconds,
            health_port,
            asr_command: text("ASR_COMMAND", DEFAULT_ASR_COMMAND),
            tts_command: text("TTS_COMMAND", DEFAULT_TTS_COMMAND),
            tts_language: text("TTS_LANGUAGE", "ru"),
            lemma_table: get("LEMMA_TABLE").map(PathBuf::from),
            ffmpeg: text("FFMPEG", "ffmpeg"),
            api_url: text("TELEGRAM_API_URL", DEFAULT_API_URL),
        })
    }

    /// Pipeline settings derived from this configuration
    pub fn pipeline_config(&self) -> PipelineConfig {
        let defaults = PipelineConfig::default();
        PipelineConfig {
            language: self.tts_language.clone(),
            speaker_wav: self.speaker_wav.clone(),
            temp_dir: self.data_dir.clone(),
            speech_tempo: self.speech_tempo,
            max_text_chars: self.max_text_chars,
            max_voice_seconds: self.max_voice_seconds,
            delivery_timeout: self.telegram_timeout,
            voice_retry: RetryPolicy::new(3, Duration::from_secs(2)),
            audio_retry: RetryPolicy::new(2, Duration::from_secs(2)),
            ..defaults
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bot_token", &"***")
            .field("data_dir", &self.data_dir)
            .field("dict_path", &self.dict_path)
            .field("speaker_wav", &self.speaker_wav)
            .field("speech_tempo", &self.speech_tempo)
            .field("telegram_timeout", &self.telegram_timeout)
            .field("max_text_chars", &self.max_text_chars)
            .field("max_voice_seconds", &self.max_voice_seconds)
            .field("health_port", &self.health_port)
            .field("lemma_table", &self.lemma_table)
            .finish()
    }
}

fn parse_number<T: FromStr>(key: &str, raw: Option<String>, default: T) -> JgResult<T> {
    match raw {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| JgError::Config(format!("Invalid {}: {}", key, raw))),
    }
}
