//! Offline dictionary builder
//!
//! Combines a hand-written seed lexicon with a Russian frequency word list:
//! seed pairs are kept as they are, and frequent lemmas without a seed entry
//! get a generated Jangaloga word until the dictionary reaches its target
//! size. The result is a [`LexiconDocument`] ready to be written to disk.

use crate::error::{JgError, JgResult};
use crate::generator::generate;
use crate::lexicon::{FallbackPolicy, LANGUAGE_NAME, LexiconDocument, normalize_word};
use crate::morphology::{MorphologyOracle, PartOfSpeech};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

static RU_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[А-Яа-яЁё]+$").expect("valid word regex"));

/// Lemmas added before the frequency list so they are always present
pub const ENSURED_LEMMAS: [&str; 16] = [
    "красивый",
    "красота",
    "важный",
    "интересный",
    "удобный",
    "попробовать",
    "помочь",
    "понять",
    "сделать",
    "сказать",
    "думать",
    "читать",
    "писать",
    "говорить",
    "слышать",
    "видеть",
];

/// The frequency list is oversampled because lemmatization merges many forms
const OVERSAMPLE: usize = 5;

/// Inputs for one dictionary build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Target total number of entries, seed included
    pub target_size: usize,
    /// Recorded in the output metadata
    pub source_seed: String,
}

/// Whether a token is a single Cyrillic word
pub fn is_ru_word(token: &str) -> bool {
    RU_WORD_RE.is_match(token)
}

/// Read a frequency list: one word per line, first whitespace-separated field
///
/// Blank lines and lines starting with `#` are skipped. Words keep the order
/// of the file, most frequent first.
pub fn load_word_list(path: &Path) -> JgResult<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| {
        JgError::Io(format!("Failed to read word list '{}': {}", path.display(), e))
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect())
}

/// Read the seed document
///
/// Unlike the serving lexicon, a missing seed is an error.
pub fn load_seed(path: &Path) -> JgResult<LexiconDocument> {
    let content = fs::read_to_string(path)
        .map_err(|e| JgError::Io(format!("Failed to read seed '{}': {}", path.display(), e)))?;
    let mut seed: LexiconDocument = serde_json::from_str(&content)
        .map_err(|e| JgError::Parse(format!("Failed to parse seed '{}': {}", path.display(), e)))?;
    // A seed that does not mention lemmatization builds a lemmatizing dictionary
    let raw: Value = serde_json::from_str(&content)?;
    if raw.get("lemmatize_ru").is_none() {
        seed.lemmatize_ru = true;
    }
    seed.validate()?;
    Ok(seed)
}

fn lemma_and_pos(oracle: &dyn MorphologyOracle, word: &str) -> (String, Option<PartOfSpeech>) {
    match oracle.analyze(word) {
        Some(analysis) if !analysis.lemma.trim().is_empty() => {
            (normalize_word(&analysis.lemma), analysis.pos)
        }
        _ => (word.to_string(), None),
    }
}

/// Build a dictionary document from a seed and a frequency list
///
/// # Arguments
/// * `seed` - Curated pairs; they always win over generated ones
/// * `frequency_list` - Russian words, most frequent first
/// * `oracle` - Lemmatizer used to merge inflected forms and pick endings
/// * `options` - Target size and metadata
///
/// # Policy override
/// A seed with the `keep_original` policy produces a `drop_unknown`
/// dictionary, so served output only ever contains Jangaloga words. Any other
/// seed policy is kept.
pub fn build_dictionary<'a>(
    seed: &LexiconDocument,
    frequency_list: impl IntoIterator<Item = &'a str>,
    oracle: &dyn MorphologyOracle,
    options: &BuildOptions,
) -> JgResult<LexiconDocument> {
    let mut ru_to_jg = seed.ru_to_jg.clone();
    let mut reserved: HashSet<String> = ru_to_jg.values().cloned().collect();
    let fallback_policy = match seed.fallback_policy {
        FallbackPolicy::KeepOriginal => FallbackPolicy::DropUnknown,
        other => other,
    };

    let mut seen: HashSet<String> = HashSet::new();
    let mut candidates: Vec<(String, Option<PartOfSpeech>)> = Vec::new();

    let mut consider = |word: &str, candidates: &mut Vec<(String, Option<PartOfSpeech>)>| {
        let word = normalize_word(word);
        if !is_ru_word(&word) {
            return;
        }
        let (lemma, pos) = lemma_and_pos(oracle, &word);
        if seen.contains(&lemma) || ru_to_jg.contains_key(&lemma) {
            return;
        }
        seen.insert(lemma.clone());
        candidates.push((lemma, pos));
    };

    for word in ENSURED_LEMMAS {
        consider(word, &mut candidates);
    }
    let budget = options.target_size.saturating_mul(OVERSAMPLE);
    for word in frequency_list.into_iter().take(budget) {
        if ru_to_jg.len() + candidates.len() >= options.target_size {
            break;
        }
        consider(word, &mut candidates);
    }

    for (lemma, pos) in candidates {
        if ru_to_jg.len() >= options.target_size {
            break;
        }
        let word = generate(&lemma, &reserved, pos)?;
        debug!(lemma = %lemma, word = %word, "Generated entry");
        reserved.insert(word.clone());
        ru_to_jg.insert(lemma, word);
    }

    let mut meta = seed.meta.clone();
    meta.insert(
        "language_name".to_string(),
        Value::String(LANGUAGE_NAME.to_string()),
    );
    meta.insert(
        "note".to_string(),
        Value::String("Сгенерировано из seed + частотного списка. Seed-пары имеют приоритет.".to_string()),
    );
    meta.insert(
        "source_seed".to_string(),
        Value::String(options.source_seed.clone()),
    );
    meta.insert("target_size".to_string(), Value::from(options.target_size));
    meta.insert("actual_size".to_string(), Value::from(ru_to_jg.len()));

    info!(
        seed = seed.ru_to_jg.len(),
        total = ru_to_jg.len(),
        policy = ?fallback_policy,
        "Built dictionary"
    );

    Ok(LexiconDocument {
        meta,
        ru_to_jg,
        fallback_policy,
        lemmatize_ru: seed.lemmatize_ru,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morphology::{Analysis, LemmaTable, NullMorphology};
    use std::collections::HashMap;

    fn options(target_size: usize) -> BuildOptions {
        BuildOptions {
            target_size,
            source_seed: "dictionary_seed.json".to_string(),
        }
    }

    fn seed(pairs: &[(&str, &str)]) -> LexiconDocument {
        let mut document = LexiconDocument::default();
        for (ru, jg) in pairs {
            document.ru_to_jg.insert(ru.to_string(), jg.to_string());
        }
        document
    }

    #[test]
    fn test_is_ru_word() {
        assert!(is_ru_word("привет"));
        assert!(is_ru_word("ёлка"));
        assert!(!is_ru_word("hello"));
        assert!(!is_ru_word("из-за"));
        assert!(!is_ru_word(""));
    }

    #[test]
    fn test_seed_pairs_have_priority() {
        let seed = seed(&[("привет", "монони"), ("читать", "бокить")]);
        let built = build_dictionary(&seed, ["привет", "мир"], &NullMorphology, &options(50)).unwrap();
        assert_eq!(built.ru_to_jg["привет"], "монони");
        assert_eq!(built.ru_to_jg["читать"], "бокить");
        assert!(built.ru_to_jg.contains_key("мир"));
    }

    #[test]
    fn test_target_size_is_respected() {
        let seed = seed(&[("привет", "монони")]);
        let built = build_dictionary(&seed, ["мир", "дом", "кот"], &NullMorphology, &options(5)).unwrap();
        assert_eq!(built.ru_to_jg.len(), 5);
        assert_eq!(built.meta["actual_size"], Value::from(5));
        assert_eq!(built.meta["target_size"], Value::from(5));
        // Ensured lemmas come first
        assert!(built.ru_to_jg.contains_key("красивый"));
    }

    #[test]
    fn test_keep_original_becomes_drop_unknown() {
        let built = build_dictionary(&seed(&[]), ["мир"], &NullMorphology, &options(3)).unwrap();
        assert_eq!(built.fallback_policy, FallbackPolicy::DropUnknown);

        let mut marking = seed(&[]);
        marking.fallback_policy = FallbackPolicy::MarkUnknown;
        let built = build_dictionary(&marking, ["мир"], &NullMorphology, &options(3)).unwrap();
        assert_eq!(built.fallback_policy, FallbackPolicy::MarkUnknown);
    }

    #[test]
    fn test_generated_words_are_unique_and_avoid_seed() {
        let seed = seed(&[("привет", "монони")]);
        let words = ["мир", "дом", "кот", "лес", "река", "гора", "небо", "море"];
        let built = build_dictionary(&seed, words, &NullMorphology, &options(100)).unwrap();
        let values: HashSet<&String> = built.ru_to_jg.values().collect();
        assert_eq!(values.len(), built.ru_to_jg.len());
    }

    #[test]
    fn test_forms_merge_into_lemmas() {
        let table = LemmaTable::new(HashMap::from([
            (
                "мамы".to_string(),
                Analysis {
                    lemma: "мама".to_string(),
                    pos: Some(PartOfSpeech::Noun),
                },
            ),
            (
                "маме".to_string(),
                Analysis {
                    lemma: "мама".to_string(),
                    pos: Some(PartOfSpeech::Noun),
                },
            ),
        ]));
        let built = build_dictionary(&seed(&[]), ["мамы", "маме", "hello", "из-за"], &table, &options(100))
            .unwrap();
        assert!(built.ru_to_jg.contains_key("мама"));
        assert!(!built.ru_to_jg.contains_key("мамы"));
        assert!(!built.ru_to_jg.contains_key("hello"));
        assert_eq!(built.ru_to_jg.len(), ENSURED_LEMMAS.len() + 1);
    }

    #[test]
    fn test_build_is_reproducible() {
        let words = ["мир", "дом", "кот"];
        let first = build_dictionary(&seed(&[]), words, &NullMorphology, &options(30)).unwrap();
        let second = build_dictionary(&seed(&[]), words, &NullMorphology, &options(30)).unwrap();
        assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
    }

    #[test]
    fn test_load_word_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("words.txt");
        fs::write(&path, "# freq list\nи 1000\n\nв 900\n  не\t800 \n").unwrap();
        assert_eq!(load_word_list(&path).unwrap(), vec!["и", "в", "не"]);
    }

    #[test]
    fn test_load_seed_defaults_lemmatize_on() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        fs::write(&path, r#"{"ru_to_jg": {"привет": "монони"}}"#).unwrap();
        let seed = load_seed(&path).unwrap();
        assert!(seed.lemmatize_ru);

        fs::write(&path, r#"{"ru_to_jg": {}, "lemmatize_ru": false}"#).unwrap();
        assert!(!load_seed(&path).unwrap().lemmatize_ru);
    }

    #[test]
    fn test_load_seed_missing_is_error() {
        assert!(matches!(
            load_seed(Path::new("/no/such/seed.json")),
            Err(JgError::Io(_))
        ));
    }
}
