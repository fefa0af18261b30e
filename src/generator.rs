//! Deterministic pseudo-word generator
//!
//! Produces Jangaloga-looking words for Russian lemmas that have no curated
//! translation. Every choice is driven by bytes of the SHA-256 digest of the
//! normalized source word, so regenerating a dictionary is reproducible and
//! diffable without a random number generator.

use crate::error::{JgError, JgResult};
use crate::lexicon::normalize_word;
use crate::morphology::PartOfSpeech;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

const CONSONANTS: [&str; 14] = [
    "г", "к", "п", "б", "д", "м", "н", "л", "ж", "ч", "т", "з", "р", "с",
];
const VOWELS: [&str; 9] = ["а", "о", "у", "я", "ё", "и", "э", "ю", "е"];
const BLENDS: [&str; 15] = [
    "гл", "лю", "но", "па", "гу", "жо", "ни", "ля", "мо", "бо", "до", "ти", "по", "чо", "ма",
];

const VERB_ENDINGS: [&str; 4] = ["ить", "нить", "ожить", "ать"];
const ADJECTIVE_ENDINGS: [&str; 4] = ["ати", "ий", "ино", "ый"];
const NOUN_ENDINGS: [&str; 6] = ["а", "я", "они", "ка", "ти", "ня"];

/// Suffixes appended, in order, when a candidate is already reserved
pub const DISAMBIGUATION_SUFFIXES: [&str; 2] = ["я", "ни"];

const MIN_SYLLABLES: usize = 2;
const SYLLABLE_SPREAD: u8 = 3;

/// Generate a Jangaloga word for `source_word`
///
/// # Arguments
///
/// * `source_word` - Russian word; normalized (lowercase, `ё` → `е`) first
/// * `reserved` - Words the result must not equal (existing dictionary values)
/// * `pos_hint` - Part of speech selecting the ending pool; `None` uses nouns
///
/// # Returns
///
/// * `Ok(String)` - A word that is not in `reserved`
/// * `Err(JgError::Validation)` - If the word is empty after normalization
/// * `Err(JgError::Collision)` - If both disambiguation suffixes still collide
///
/// # Example
///
/// ```ignore
/// let reserved = HashSet::new();
/// let first = generate("мама", &reserved, None)?;
/// assert_eq!(first, generate("мама", &reserved, None)?);
/// ```
pub fn generate(
    source_word: &str,
    reserved: &HashSet<String>,
    pos_hint: Option<PartOfSpeech>,
) -> JgResult<String> {
    let word = normalize_word(source_word);
    if word.is_empty() {
        return Err(JgError::Validation(
            "Cannot generate a word for empty input".to_string(),
        ));
    }

    let candidate = base_candidate(&word, pos_hint);
    disambiguate(candidate, reserved)
}

/// The word before any collision handling
pub fn base_candidate(normalized_word: &str, pos_hint: Option<PartOfSpeech>) -> String {
    let digest = Sha256::digest(normalized_word.as_bytes());
    let d = digest.as_slice();

    let syllables = MIN_SYLLABLES + usize::from(d[0] % SYLLABLE_SPREAD);
    let mut word = String::new();
    for i in 0..syllables {
        if d[16 + i] % 4 == 0 {
            word.push_str(pick(&BLENDS, d[24 + i]));
        } else {
            word.push_str(pick(&CONSONANTS, d[1 + i]));
            word.push_str(pick(&VOWELS, d[8 + i]));
        }
    }

    let ending = match pos_hint {
        Some(PartOfSpeech::Verb) => pick(&VERB_ENDINGS, d[31]),
        Some(PartOfSpeech::Adjective) => pick(&ADJECTIVE_ENDINGS, d[30]),
        Some(PartOfSpeech::Noun) | None => pick(&NOUN_ENDINGS, d[29]),
    };
    word.push_str(ending);
    word
}

fn pick<'a>(pool: &[&'a str], byte: u8) -> &'a str {
    pool[usize::from(byte) % pool.len()]
}

fn disambiguate(mut candidate: String, reserved: &HashSet<String>) -> JgResult<String> {
    if !reserved.contains(&candidate) {
        return Ok(candidate);
    }
    for suffix in DISAMBIGUATION_SUFFIXES {
        candidate.push_str(suffix);
        if !reserved.contains(&candidate) {
            return Ok(candidate);
        }
    }
    Err(JgError::Collision(format!(
        "'{}' is still reserved after disambiguation",
        candidate
    )))
}
