//! Temporary files owned by one pipeline run

use crate::error::JgResult;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::debug;

/// Scratch files of a single message
///
/// Every file handed out by [`Session::file`] is deleted when the session is
/// dropped, whichever way the pipeline exits. Deletion errors are ignored.
#[derive(Debug)]
pub struct Session {
    dir: PathBuf,
    files: Vec<TempPath>,
}

impl Session {
    /// Open a session whose files live in `dir` (created if missing)
    pub fn new(dir: impl Into<PathBuf>) -> JgResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            files: Vec::new(),
        })
    }

    /// Reserve a fresh, empty file such as `jg-input-XXXX.ogg`
    pub fn file(&mut self, label: &str, suffix: &str) -> JgResult<PathBuf> {
        let temp = tempfile::Builder::new()
            .prefix(&format!("jg-{}-", label))
            .suffix(suffix)
            .tempfile_in(&self.dir)?;
        let path = temp.path().to_path_buf();
        self.files.push(temp.into_temp_path());
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths of every file handed out so far
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|p| p.to_path_buf()).collect()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for file in self.files.drain(..) {
            let path = file.to_path_buf();
            if let Err(e) = file.close() {
                debug!(path = %path.display(), error = %e, "Failed to remove temp file");
            }
        }
    }
}
