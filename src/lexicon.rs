//! Bilingual lexicon store
//!
//! The lexicon maps normalized Russian word-forms to Jangaloga words. It is
//! loaded once from a JSON document, consulted read-only by the translator,
//! and mutated only through [`Lexicon::add`], which rewrites the whole
//! document atomically.
//!
//! # Document format
//!
//! ```json
//! {
//!     "meta": { "language_name": "Джангалога" },
//!     "ru_to_jg": { "привет": "монони" },
//!     "fallback_policy": "keep_original",
//!     "lemmatize_ru": false
//! }
//! ```

use crate::error::{JgError, JgResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const LANGUAGE_NAME: &str = "Джангалога";

/// What the translator emits for a word the lexicon cannot resolve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Emit the source token verbatim
    #[default]
    KeepOriginal,
    /// Wrap the source token in `⟦` `⟧`
    MarkUnknown,
    /// Emit nothing for the token
    DropUnknown,
}

/// Serde model of the persisted lexicon document
///
/// `ru_to_jg` is a `BTreeMap`, so serialization always writes keys in
/// lexicographic order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconDocument {
    #[serde(default)]
    pub meta: Map<String, Value>,
    #[serde(default)]
    pub ru_to_jg: BTreeMap<String, String>,
    #[serde(default)]
    pub fallback_policy: FallbackPolicy,
    #[serde(default)]
    pub lemmatize_ru: bool,
}

impl Default for LexiconDocument {
    fn default() -> Self {
        Self {
            meta: Map::new(),
            ru_to_jg: BTreeMap::new(),
            fallback_policy: FallbackPolicy::KeepOriginal,
            lemmatize_ru: false,
        }
    }
}

impl LexiconDocument {
    /// Check the non-empty value invariant
    pub fn validate(&self) -> JgResult<()> {
        for (key, value) in &self.ru_to_jg {
            if key.trim().is_empty() {
                return Err(JgError::Validation(
                    "Lexicon contains an empty source word".to_string(),
                ));
            }
            if value.trim().is_empty() {
                return Err(JgError::Validation(format!(
                    "Lexicon entry '{}' has an empty target word",
                    key
                )));
            }
        }
        Ok(())
    }

    /// Serialize as pretty JSON, filling in default metadata when absent
    pub fn to_json(&self) -> JgResult<String> {
        let mut doc = self.clone();
        if doc.meta.is_empty() {
            doc.meta = default_meta();
        }
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    /// Write the document to `path` atomically
    ///
    /// The JSON is written to a temporary file in the destination directory
    /// and renamed over `path`, so a reader sees either the old or the new
    /// document, never a partial one.
    pub fn write_atomic(&self, path: &Path) -> JgResult<()> {
        let json = self.to_json()?;
        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent_dir)?;

        let temp_file = NamedTempFile::new_in(parent_dir)?;
        {
            let mut writer = BufWriter::new(temp_file.as_file());
            writer.write_all(json.as_bytes())?;
            writer.flush()?;
        }
        temp_file
            .persist(path)
            .map_err(|e| JgError::Io(format!("Failed to persist '{}': {}", path.display(), e)))?;
        Ok(())
    }
}

fn default_meta() -> Map<String, Value> {
    let mut meta = Map::new();
    meta.insert(
        "language_name".to_string(),
        Value::String(LANGUAGE_NAME.to_string()),
    );
    meta.insert(
        "note".to_string(),
        Value::String("Словарь заполняется пользователем.".to_string()),
    );
    meta
}

/// Normalize a Russian word-form into a lexicon key
///
/// Trims, lowercases and folds `ё` into `е`.
pub fn normalize_word(word: &str) -> String {
    word.trim().to_lowercase().replace('ё', "е")
}

/// In-memory lexicon bound to its backing document
#[derive(Debug, Clone)]
pub struct Lexicon {
    path: PathBuf,
    document: LexiconDocument,
}

impl Lexicon {
    /// Load the lexicon stored at `path`
    ///
    /// A missing document is not an error: the result is an empty lexicon
    /// with the `keep_original` policy and lemmatization off.
    ///
    /// # Errors
    /// - `JgError::Io` when the file exists but cannot be read
    /// - `JgError::Parse` when the JSON is malformed or the policy is unknown
    /// - `JgError::Validation` when an entry has an empty target word
    pub fn load(path: impl Into<PathBuf>) -> JgResult<Self> {
        let path = path.into();
        if !path.exists() {
            debug!(path = %path.display(), "Lexicon document missing, starting empty");
            return Ok(Self::from_document(path, LexiconDocument::default()));
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| JgError::Io(format!("Failed to read '{}': {}", path.display(), e)))?;
        let document: LexiconDocument = serde_json::from_str(&content).map_err(|e| {
            JgError::Parse(format!("Failed to parse lexicon '{}': {}", path.display(), e))
        })?;
        document.validate()?;

        info!(
            path = %path.display(),
            entries = document.ru_to_jg.len(),
            policy = ?document.fallback_policy,
            lemmatize = document.lemmatize_ru,
            "Loaded lexicon"
        );
        Ok(Self::from_document(path, document))
    }

    /// Wrap an already built document
    pub fn from_document(path: impl Into<PathBuf>, document: LexiconDocument) -> Self {
        Self {
            path: path.into(),
            document,
        }
    }

    /// Exact-match lookup of an already normalized form
    pub fn resolve(&self, form: &str) -> Option<&str> {
        self.document.ru_to_jg.get(form).map(String::as_str)
    }

    /// Add or overwrite an entry and persist the whole document
    ///
    /// # Arguments
    /// * `source_word` - Russian word, normalized before insertion
    /// * `target_word` - Jangaloga word, trimmed before insertion
    ///
    /// # Errors
    /// - `JgError::Validation` when either word is empty after trimming; the
    ///   lexicon and its document are left untouched
    /// - `JgError::Io` when the document cannot be written; the lexicon keeps
    ///   its previous entries
    pub fn add(&mut self, source_word: &str, target_word: &str) -> JgResult<()> {
        let key = normalize_word(source_word);
        if key.is_empty() {
            return Err(JgError::Validation("Empty Russian word".to_string()));
        }
        let value = target_word.trim();
        if value.is_empty() {
            return Err(JgError::Validation("Empty Jangaloga word".to_string()));
        }

        let mut updated = self.document.clone();
        updated.ru_to_jg.insert(key.clone(), value.to_string());
        updated.write_atomic(&self.path)?;
        self.document = updated;
        info!(source = %key, target = %value, "Added lexicon entry");
        Ok(())
    }

    /// Rewrite the backing document
    pub fn save(&self) -> JgResult<()> {
        self.document.write_atomic(&self.path)
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        self.document.fallback_policy
    }

    pub fn lemmatize(&self) -> bool {
        self.document.lemmatize_ru
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &LexiconDocument {
        &self.document
    }

    pub fn len(&self) -> usize {
        self.document.ru_to_jg.len()
    }

    pub fn is_empty(&self) -> bool {
        self.document.ru_to_jg.is_empty()
    }

    /// All target words, used as the reserved set when generating new ones
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.document.ru_to_jg.values().map(String::as_str)
    }
}
