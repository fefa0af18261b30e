//! Morphology oracle abstraction
//!
//! Lemmatization is an optional capability. The translator and the dictionary
//! builder only see the [`MorphologyOracle`] trait; which implementation backs
//! it is decided once at startup by [`select`]. When no analyzer is available
//! the [`NullMorphology`] oracle answers "no lemma" for every word, which
//! degrades translation to exact-form lookup.

use crate::error::{JgError, JgResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Coarse part-of-speech tag reported by an oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Verb,
    #[serde(alias = "adj")]
    Adjective,
    Noun,
}

impl PartOfSpeech {
    /// Parse a tag as written on the command line or in a lemma table
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "verb" => Some(PartOfSpeech::Verb),
            "adj" | "adjective" => Some(PartOfSpeech::Adjective),
            "noun" => Some(PartOfSpeech::Noun),
            _ => None,
        }
    }
}

/// Result of analyzing one word-form
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Analysis {
    /// Dictionary form of the word
    pub lemma: String,
    /// Coarse part of speech, when the analyzer knows it
    #[serde(default)]
    pub pos: Option<PartOfSpeech>,
}

/// Capability interface for lemmatization
///
/// Implementations must never fail loudly: any internal problem is reported as
/// `None`, and callers fall back to the word-form they already have.
pub trait MorphologyOracle: Send + Sync {
    /// Analyze a normalized word-form (lowercase, `ё` folded to `е`)
    fn analyze(&self, word: &str) -> Option<Analysis>;

    /// Name used in logs
    fn oracle_name(&self) -> &str;
}

/// Oracle used when no analyzer is installed
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMorphology;

impl MorphologyOracle for NullMorphology {
    fn analyze(&self, _word: &str) -> Option<Analysis> {
        None
    }

    fn oracle_name(&self) -> &str {
        "none"
    }
}

/// Lemma lookup table loaded from a JSON document
///
/// The document maps word-forms to analyses:
///
/// ```json
/// {
///     "мамы": { "lemma": "мама", "pos": "noun" },
///     "читает": { "lemma": "читать", "pos": "verb" }
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct LemmaTable {
    forms: HashMap<String, Analysis>,
}

impl LemmaTable {
    pub fn new(forms: HashMap<String, Analysis>) -> Self {
        Self { forms }
    }

    /// Load a lemma table from disk
    ///
    /// # Errors
    /// - `JgError::Io` when the file cannot be read
    /// - `JgError::Parse` when the JSON does not match the table shape
    pub fn load(path: &Path) -> JgResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            JgError::Io(format!("Failed to read lemma table '{}': {}", path.display(), e))
        })?;
        let forms: HashMap<String, Analysis> = serde_json::from_str(&content).map_err(|e| {
            JgError::Parse(format!(
                "Failed to parse lemma table '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self { forms })
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

impl MorphologyOracle for LemmaTable {
    fn analyze(&self, word: &str) -> Option<Analysis> {
        self.forms
            .get(word)
            .filter(|analysis| !analysis.lemma.trim().is_empty())
            .cloned()
    }

    fn oracle_name(&self) -> &str {
        "lemma-table"
    }
}

/// Pick the morphology oracle once, at startup
///
/// Returns the lemma table when `path` is given and loads, otherwise the null
/// oracle. A table that fails to load is logged and ignored.
pub fn select(path: Option<&Path>) -> Arc<dyn MorphologyOracle> {
    let Some(path) = path else {
        info!("No lemma table configured, lemmatization disabled");
        return Arc::new(NullMorphology);
    };
    match LemmaTable::load(path) {
        Ok(table) => {
            info!(path = %path.display(), forms = table.len(), "Loaded lemma table");
            Arc::new(table)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Lemma table unavailable, lemmatization disabled");
            Arc::new(NullMorphology)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn table_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_null_oracle_never_answers() {
        assert_eq!(NullMorphology.analyze("мамы"), None);
        assert_eq!(NullMorphology.oracle_name(), "none");
    }

    #[test]
    fn test_lemma_table_lookup() {
        let file = table_file(
            r#"{"мамы": {"lemma": "мама", "pos": "noun"}, "читает": {"lemma": "читать", "pos": "verb"}}"#,
        );
        let table = LemmaTable::load(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.analyze("мамы"),
            Some(Analysis {
                lemma: "мама".to_string(),
                pos: Some(PartOfSpeech::Noun)
            })
        );
        assert_eq!(table.analyze("папы"), None);
    }

    #[test]
    fn test_lemma_table_adj_alias_and_missing_pos() {
        let file = table_file(r#"{"красивая": {"lemma": "красивый", "pos": "adj"}, "и": {"lemma": "и"}}"#);
        let table = LemmaTable::load(file.path()).unwrap();
        assert_eq!(
            table.analyze("красивая").unwrap().pos,
            Some(PartOfSpeech::Adjective)
        );
        assert_eq!(table.analyze("и").unwrap().pos, None);
    }

    #[test]
    fn test_lemma_table_ignores_blank_lemma() {
        let table = LemmaTable::new(HashMap::from([(
            "слово".to_string(),
            Analysis {
                lemma: "  ".to_string(),
                pos: None,
            },
        )]));
        assert_eq!(table.analyze("слово"), None);
    }

    #[test]
    fn test_lemma_table_parse_error() {
        let file = table_file("[1, 2, 3]");
        assert!(matches!(
            LemmaTable::load(file.path()),
            Err(JgError::Parse(_))
        ));
    }

    #[test]
    fn test_select_falls_back_to_null() {
        let oracle = select(Some(Path::new("/definitely/not/here.json")));
        assert_eq!(oracle.oracle_name(), "none");
        let oracle = select(None);
        assert_eq!(oracle.oracle_name(), "none");
    }

    #[test]
    fn test_select_uses_table() {
        let file = table_file(r#"{"мамы": {"lemma": "мама"}}"#);
        let oracle = select(Some(file.path()));
        assert_eq!(oracle.oracle_name(), "lemma-table");
        assert_eq!(oracle.analyze("мамы").unwrap().lemma, "мама");
    }

    #[test]
    fn test_part_of_speech_parse() {
        assert_eq!(PartOfSpeech::parse("VERB"), Some(PartOfSpeech::Verb));
        assert_eq!(PartOfSpeech::parse("adj"), Some(PartOfSpeech::Adjective));
        assert_eq!(PartOfSpeech::parse("noun"), Some(PartOfSpeech::Noun));
        assert_eq!(PartOfSpeech::parse("adverb"), None);
    }
}
