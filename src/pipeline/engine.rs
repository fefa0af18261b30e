//! Lazily initialized engine handles
//!
//! Loading a speech model is slow, so engines are created on first use
//! rather than at startup. [`LazyEngine`] owns the initializer and runs it at
//! most once, even when several tasks hit the engine at the same moment.
//! A failed initialization leaves the handle empty and the next call tries
//! again.

use crate::error::{JgError, JgResult};
use crate::pipeline::collaborators::{SpeechRecognizer, SpeechSynthesizer};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

type Initializer<T> = Arc<dyn Fn() -> JgResult<T> + Send + Sync>;

/// Engine created on first use
pub struct LazyEngine<T> {
    name: String,
    cell: OnceCell<Arc<T>>,
    init: Initializer<T>,
}

impl<T: Send + Sync + 'static> LazyEngine<T> {
    /// Wrap a blocking initializer
    ///
    /// The initializer runs on the blocking thread pool.
    pub fn new(
        name: impl Into<String>,
        init: impl Fn() -> JgResult<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            cell: OnceCell::new(),
            init: Arc::new(init),
        }
    }

    /// Get the engine, initializing it if needed
    pub async fn get(&self) -> JgResult<Arc<T>> {
        self.cell
            .get_or_try_init(|| async {
                info!(engine = %self.name, "Initializing engine");
                let init = Arc::clone(&self.init);
                let engine = tokio::task::spawn_blocking(move || init())
                    .await
                    .map_err(|e| {
                        JgError::Unavailable(format!("{} initialization panicked: {}", self.name, e))
                    })??;
                info!(engine = %self.name, "Engine ready");
                Ok(Arc::new(engine))
            })
            .await
            .cloned()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<T: SpeechRecognizer + 'static> SpeechRecognizer for LazyEngine<T> {
    async fn transcribe(&self, wav: &Path, language: &str) -> JgResult<String> {
        self.get().await?.transcribe(wav, language).await
    }

    fn engine_name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<T: SpeechSynthesizer + 'static> SpeechSynthesizer for LazyEngine<T> {
    async fn synthesize(
        &self,
        text: &str,
        speaker_wav: &Path,
        language: &str,
        out_wav: &Path,
    ) -> JgResult<()> {
        self.get()
            .await?
            .synthesize(text, speaker_wav, language, out_wav)
            .await
    }

    fn engine_name(&self) -> &str {
        &self.name
    }
}
