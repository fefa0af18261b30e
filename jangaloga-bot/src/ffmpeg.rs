//! ffmpeg-backed [`Transcoder`]

use async_trait::async_trait;
use jangaloga::pipeline::Transcoder;
use jangaloga::{JgError, JgResult};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Find an executable the way a shell would
///
/// A name containing a path separator is checked as given; anything else is
/// searched in `PATH`.
pub fn find_executable(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}

/// Runs ffmpeg as a subprocess per conversion
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: String,
    available: bool,
}

impl FfmpegTranscoder {
    /// Probe for `program` once
    pub fn detect(program: &str) -> Self {
        let available = find_executable(program).is_some();
        if !available {
            warn!(program, "ffmpeg not found, voice messages disabled");
        }
        Self {
            program: program.to_string(),
            available,
        }
    }

    /// Full argument list of one conversion
    pub fn command_args(input: &Path, output: &Path, args: &[String]) -> Vec<String> {
        let mut full = vec![
            "-y".to_string(),
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.display().to_string(),
        ];
        full.extend(args.iter().cloned());
        full.push(output.display().to_string());
        full
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn convert(&self, input: &Path, output: &Path, args: &[String]) -> JgResult<()> {
        if !self.available {
            return Err(JgError::Unavailable(format!("{} not found", self.program)));
        }
        let full = Self::command_args(input, output, args);
        debug!(program = %self.program, args = ?full, "Running transcoder");

        let result = Command::new(&self.program)
            .args(&full)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| JgError::Stage(format!("Failed to start {}: {}", self.program, e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(JgError::Stage(format!(
                "{} exited with {:?}: {}",
                self.program,
                result.status.code(),
                stderr.trim()
            )));
        }
        Ok(())
    }
}
