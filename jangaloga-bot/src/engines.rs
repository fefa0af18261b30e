//! Speech engines driven by external commands
//!
//! Recognition and synthesis run as subprocesses described by command
//! templates such as `whisper-cli -l {language} -f {input}`. Templates are
//! split on whitespace once; placeholders are substituted per argument, so a
//! `{text}` argument stays a single argv entry however many spaces it holds.
//! No shell is involved.

use crate::ffmpeg::find_executable;
use async_trait::async_trait;
use jangaloga::pipeline::{LazyEngine, SpeechRecognizer, SpeechSynthesizer};
use jangaloga::{JgError, JgResult};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info};

fn substitute(arg: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(arg.len());
    let mut rest = arg;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail.find('}').and_then(|close| {
            let name = &tail[1..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// A parsed command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    pub fn parse(template: &str) -> JgResult<Self> {
        let mut parts = template.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| JgError::Config("Empty command template".to_string()))?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Substitute `{name}` placeholders in every argument
    ///
    /// Each argument is scanned once, so substituted values are never
    /// expanded again. Unknown placeholders are kept verbatim.
    pub fn expand(&self, values: &[(&str, &str)]) -> Vec<String> {
        self.args
            .iter()
            .map(|arg| substitute(arg, values))
            .collect()
    }

    /// Fail unless the program can be found
    pub fn ensure_available(&self) -> JgResult<()> {
        find_executable(&self.program)
            .map(|path| info!(program = %path.display(), "Found engine executable"))
            .ok_or_else(|| JgError::Unavailable(format!("{} not found", self.program)))
    }

    /// Run with `values` substituted, returning stdout
    async fn run(&self, values: &[(&str, &str)]) -> JgResult<Vec<u8>> {
        let args = self.expand(values);
        debug!(program = %self.program, "Running engine command");
        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| JgError::Stage(format!("Failed to start {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(JgError::Stage(format!(
                "{} exited with {:?}: {}",
                self.program,
                output.status.code(),
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

/// Speech recognition through a command printing the transcript to stdout
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    template: CommandTemplate,
}

impl CommandRecognizer {
    pub fn new(template: CommandTemplate) -> Self {
        Self { template }
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    async fn transcribe(&self, wav: &Path, language: &str) -> JgResult<String> {
        let input = wav.display().to_string();
        let stdout = self
            .template
            .run(&[("input", &input), ("language", language)])
            .await?;
        Ok(collapse_lines(&String::from_utf8_lossy(&stdout)))
    }

    fn engine_name(&self) -> &str {
        self.template.program()
    }
}

/// Voice-cloning synthesis through a command writing a WAV file
#[derive(Debug, Clone)]
pub struct CommandSynthesizer {
    template: CommandTemplate,
}

impl CommandSynthesizer {
    pub fn new(template: CommandTemplate) -> Self {
        Self { template }
    }
}

#[async_trait]
impl SpeechSynthesizer for CommandSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        speaker_wav: &Path,
        language: &str,
        out_wav: &Path,
    ) -> JgResult<()> {
        let speaker = speaker_wav.display().to_string();
        let output = out_wav.display().to_string();
        self.template
            .run(&[
                ("text", text),
                ("speaker", &speaker),
                ("language", language),
                ("output", &output),
            ])
            .await?;

        let written = std::fs::metadata(out_wav).map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(JgError::Stage(format!(
                "{} produced no audio",
                self.template.program()
            )));
        }
        Ok(())
    }

    fn engine_name(&self) -> &str {
        self.template.program()
    }
}

/// Join transcript lines into one line of text
fn collapse_lines(stdout: &str) -> String {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Recognizer that checks for its executable on first use
pub fn lazy_recognizer(template: &str) -> JgResult<LazyEngine<CommandRecognizer>> {
    let template = CommandTemplate::parse(template)?;
    let name = format!("asr:{}", template.program());
    Ok(LazyEngine::new(name, move || {
        template.ensure_available()?;
        Ok(CommandRecognizer::new(template.clone()))
    }))
}

/// Synthesizer that checks for its executable on first use
pub fn lazy_synthesizer(template: &str) -> JgResult<LazyEngine<CommandSynthesizer>> {
    let template = CommandTemplate::parse(template)?;
    let name = format!("tts:{}", template.program());
    Ok(LazyEngine::new(name, move || {
        template.ensure_available()?;
        Ok(CommandSynthesizer::new(template.clone()))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_ASR_COMMAND, DEFAULT_TTS_COMMAND};

    #[test]
    fn test_parse_template() {
        let template = CommandTemplate::parse(DEFAULT_ASR_COMMAND).unwrap();
        assert_eq!(template.program(), "whisper-cli");
        assert!(matches!(CommandTemplate::parse("   "), Err(JgError::Config(_))));
    }

    #[test]
    fn test_text_placeholder_stays_one_argument() {
        let template = CommandTemplate::parse(DEFAULT_TTS_COMMAND).unwrap();
        let args = template.expand(&[
            ("text", "Монони губожя!"),
            ("speaker", "/data/speaker.wav"),
            ("language", "ru"),
            ("output", "/tmp/out.wav"),
        ]);
        assert_eq!(
            args,
            vec![
                "--text",
                "Монони губожя!",
                "--speaker_wav",
                "/data/speaker.wav",
                "--language_idx",
                "ru",
                "--out_path",
                "/tmp/out.wav",
            ]
        );
    }

    #[test]
    fn test_substituted_text_is_not_expanded_again() {
        let template = CommandTemplate::parse("tts --text {text} --out {output}").unwrap();
        let args = template.expand(&[
            ("text", "{output} и {speaker}"),
            ("speaker", "/data/speaker.wav"),
            ("output", "/tmp/out.wav"),
        ]);
        assert_eq!(args, vec!["--text", "{output} и {speaker}", "--out", "/tmp/out.wav"]);
    }

    #[test]
    fn test_unknown_placeholder_kept() {
        let template = CommandTemplate::parse("run {model}-{language} {").unwrap();
        assert_eq!(template.expand(&[("language", "ru")]), vec!["{model}-ru", "{"]);
    }

    #[test]
    fn test_collapse_lines() {
        assert_eq!(collapse_lines("  привет\n\n мир \n"), "привет мир");
        assert_eq!(collapse_lines("\n"), "");
    }

    #[tokio::test]
    async fn test_missing_engine_fails_on_first_use_only() {
        let engine = lazy_recognizer("no-such-asr-binary -f {input}").unwrap();
        assert!(!engine.is_initialized());
        let result = engine.transcribe(Path::new("in.wav"), "ru").await;
        assert!(matches!(result, Err(JgError::Unavailable(_))));
        assert_eq!(engine.engine_name(), "asr:no-such-asr-binary");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_recognizer_reads_stdout() {
        let recognizer = CommandRecognizer::new(CommandTemplate::parse("echo {language} {input}").unwrap());
        let text = recognizer.transcribe(Path::new("a.wav"), "ru").await.unwrap();
        assert_eq!(text, "ru a.wav");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_synthesizer_requires_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.wav");
        let synthesizer = CommandSynthesizer::new(CommandTemplate::parse("true {text}").unwrap());
        let result = synthesizer
            .synthesize("монони", Path::new("speaker.wav"), "ru", &out)
            .await;
        assert!(matches!(result, Err(JgError::Stage(_))));
    }
}
