//! Word-for-word Russian → Jangaloga translator
//!
//! Text is segmented into alternating runs of letters and non-letters. Every
//! letter run is looked up in the [`Lexicon`] (exact form first, then the
//! lemma reported by the [`MorphologyOracle`] when the lexicon enables
//! lemmatization). Unresolved words follow the lexicon's [`FallbackPolicy`],
//! resolved words inherit the casing pattern of the source token, and the
//! reassembled text goes through a spacing cleanup.
//!
//! # Example
//!
//! ```ignore
//! let translator = Translator::new(Arc::new(lexicon), Arc::new(NullMorphology));
//! assert_eq!(translator.translate("Привет!"), "Монони!");
//! ```

use crate::lexicon::{FallbackPolicy, Lexicon, normalize_word};
use crate::morphology::MorphologyOracle;
use regex::Regex;
use std::sync::{Arc, LazyLock};

const LETTERS: &str = "A-Za-zА-Яа-яЁё";

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("[{0}]+|[^{0}]+", LETTERS)).expect("valid token regex"));
static LETTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("[{}]", LETTERS)).expect("valid letter regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static SPACE_BEFORE_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+([,.!?;:])").expect("valid punctuation regex"));
static SPACE_AFTER_OPENING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([(\[{«])\s+").expect("valid bracket regex"));
static PUNCT_BEFORE_LETTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("([,.!?;:])([{}])", LETTERS)).expect("valid spacing regex")
});

pub const UNKNOWN_OPEN: char = '⟦';
pub const UNKNOWN_CLOSE: char = '⟧';

/// Kind of a token produced by [`tokenize`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Contiguous run of letters
    Word,
    /// Whitespace, punctuation, digits and anything else, passed through
    Literal,
}

/// A slice of the input text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub text: &'a str,
    pub kind: TokenKind,
}

/// Split text into letter and non-letter runs
///
/// The runs cover the input without gaps: concatenating every `text` gives
/// back the original string.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    TOKEN_RE
        .find_iter(text)
        .map(|m| {
            let kind = if LETTER_RE.is_match(m.as_str()) {
                TokenKind::Word
            } else {
                TokenKind::Literal
            };
            Token {
                text: m.as_str(),
                kind,
            }
        })
        .collect()
}

/// Whether the text contains at least one letter
pub fn has_letters(text: &str) -> bool {
    LETTER_RE.is_match(text)
}

/// Normalize spacing around punctuation and brackets
pub fn cleanup_spacing(text: &str) -> String {
    let collapsed = WHITESPACE_RE.replace_all(text, " ");
    let collapsed = collapsed.trim();
    let tightened = SPACE_BEFORE_PUNCT_RE.replace_all(collapsed, "$1");
    let opened = SPACE_AFTER_OPENING_RE.replace_all(&tightened, "$1");
    let spaced = PUNCT_BEFORE_LETTER_RE.replace_all(&opened, "$1 $2");
    spaced.trim().to_string()
}

/// Apply the casing pattern of `template` to `word`
///
/// - all-uppercase template: uppercase result
/// - capitalized template (first letter upper, rest lower): capitalize the
///   first letter of the result
/// - anything else, including mixed case like `ПрИвЕт`: `word` unchanged
pub fn apply_case_like(template: &str, word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    if is_all_upper(template) {
        return word.to_uppercase();
    }
    if is_capitalized(template) {
        let mut chars = word.chars();
        return match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        };
    }
    word.to_string()
}

fn is_all_upper(text: &str) -> bool {
    let mut cased = text.chars().filter(|c| c.is_lowercase() || c.is_uppercase());
    let mut any = false;
    let all_upper = cased.all(|c| {
        any = true;
        c.is_uppercase()
    });
    any && all_upper
}

fn is_capitalized(text: &str) -> bool {
    let mut chars = text.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let rest = chars.as_str();
    first.is_uppercase()
        && rest.chars().any(char::is_lowercase)
        && !rest.chars().any(char::is_uppercase)
}

/// Translation output with resolution statistics
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Translation {
    pub text: String,
    /// Letter runs found in the lexicon
    pub resolved: usize,
    /// Letter runs handled by the fallback policy
    pub unresolved: usize,
}

/// Dictionary-driven translator
///
/// Holds the lexicon read-only; translation never mutates it.
#[derive(Clone)]
pub struct Translator {
    lexicon: Arc<Lexicon>,
    morphology: Arc<dyn MorphologyOracle>,
}

impl Translator {
    pub fn new(lexicon: Arc<Lexicon>, morphology: Arc<dyn MorphologyOracle>) -> Self {
        Self {
            lexicon,
            morphology,
        }
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Translate Russian text into Jangaloga
    pub fn translate(&self, text: &str) -> String {
        self.translate_detailed(text).text
    }

    /// Translate and report how many words were resolved
    pub fn translate_detailed(&self, text: &str) -> Translation {
        let mut out = String::with_capacity(text.len());
        let mut resolved = 0;
        let mut unresolved = 0;

        for token in tokenize(text) {
            if token.kind == TokenKind::Literal {
                out.push_str(token.text);
                continue;
            }
            match self.lookup(token.text) {
                Some(target) => {
                    resolved += 1;
                    out.push_str(&apply_case_like(token.text, target));
                }
                None => {
                    unresolved += 1;
                    match self.lexicon.fallback_policy() {
                        FallbackPolicy::DropUnknown => {}
                        FallbackPolicy::MarkUnknown => {
                            out.push(UNKNOWN_OPEN);
                            out.push_str(token.text);
                            out.push(UNKNOWN_CLOSE);
                        }
                        FallbackPolicy::KeepOriginal => out.push_str(token.text),
                    }
                }
            }
        }

        Translation {
            text: cleanup_spacing(&out),
            resolved,
            unresolved,
        }
    }

    /// Resolve one letter run: exact form first, then its lemma
    fn lookup(&self, word: &str) -> Option<&str> {
        let form = normalize_word(word);
        if let Some(target) = self.lexicon.resolve(&form) {
            return Some(target);
        }
        if !self.lexicon.lemmatize() {
            return None;
        }
        let lemma = self
            .morphology
            .analyze(&form)
            .map(|analysis| normalize_word(&analysis.lemma))
            .unwrap_or(form);
        self.lexicon.resolve(&lemma)
    }
}

impl std::fmt::Debug for Translator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Translator")
            .field("entries", &self.lexicon.len())
            .field("policy", &self.lexicon.fallback_policy())
            .field("morphology", &self.morphology.oracle_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::LexiconDocument;
    use crate::morphology::{Analysis, LemmaTable, NullMorphology};
    use std::collections::HashMap;

    fn translator_with(
        entries: &[(&str, &str)],
        policy: FallbackPolicy,
        lemmatize: bool,
        morphology: Arc<dyn MorphologyOracle>,
    ) -> Translator {
        let mut document = LexiconDocument::default();
        for (ru, jg) in entries {
            document.ru_to_jg.insert(ru.to_string(), jg.to_string());
        }
        document.fallback_policy = policy;
        document.lemmatize_ru = lemmatize;
        Translator::new(
            Arc::new(Lexicon::from_document("unused.json", document)),
            morphology,
        )
    }

    fn simple(entries: &[(&str, &str)], policy: FallbackPolicy) -> Translator {
        translator_with(entries, policy, false, Arc::new(NullMorphology))
    }

    fn lemma_table(pairs: &[(&str, &str)]) -> Arc<dyn MorphologyOracle> {
        let forms = pairs
            .iter()
            .map(|(form, lemma)| {
                (
                    form.to_string(),
                    Analysis {
                        lemma: lemma.to_string(),
                        pos: None,
                    },
                )
            })
            .collect::<HashMap<_, _>>();
        Arc::new(LemmaTable::new(forms))
    }

    // ========== Tokenization Tests ==========

    #[test]
    fn test_tokenize_is_lossless() {
        let inputs = [
            "Привет, мир!",
            "  двойные  пробелы\tи\nпереводы ",
            "Ёлка (зелёная) — 3 шт.",
            "mixed латиница and кириллица",
            "",
            "123 ... !!!",
        ];
        for input in inputs {
            let rebuilt: String = tokenize(input).iter().map(|t| t.text).collect();
            assert_eq!(rebuilt, input);
        }
    }

    #[test]
    fn test_tokenize_alternates_kinds() {
        let tokens = tokenize("Привет, мир!");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Word,
                TokenKind::Literal,
                TokenKind::Word,
                TokenKind::Literal
            ]
        );
        assert_eq!(tokens[0].text, "Привет");
        assert_eq!(tokens[2].text, "мир");
    }

    #[test]
    fn test_tokenize_keeps_letter_runs_whole() {
        let tokens = tokenize("ЁжикВТумане");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Word);
    }

    // ========== Cleanup Tests ==========

    #[test]
    fn test_cleanup_collapses_whitespace() {
        assert_eq!(cleanup_spacing("  а   б \n\t в  "), "а б в");
    }

    #[test]
    fn test_cleanup_punctuation() {
        assert_eq!(cleanup_spacing("привет , мир !"), "привет, мир!");
        assert_eq!(cleanup_spacing("( скобки ) и « кавычки »"), "(скобки ) и «кавычки »");
        assert_eq!(cleanup_spacing("раз,два.три"), "раз, два. три");
        assert_eq!(cleanup_spacing("3.14 и 2,5"), "3.14 и 2,5");
    }

    #[test]
    fn test_has_letters() {
        assert!(has_letters("... а"));
        assert!(has_letters("ok"));
        assert!(!has_letters("!!! 123 , ."));
        assert!(!has_letters(""));
    }

    // ========== Casing Tests ==========

    #[test]
    fn test_apply_case_like() {
        assert_eq!(apply_case_like("ПРИВЕТ", "монони"), "МОНОНИ");
        assert_eq!(apply_case_like("Привет", "монони"), "Монони");
        assert_eq!(apply_case_like("привет", "монони"), "монони");
        assert_eq!(apply_case_like("Я", "ни"), "НИ");
        assert_eq!(apply_case_like("Привет", ""), "");
    }

    #[test]
    fn test_mixed_case_passes_through_verbatim() {
        assert_eq!(apply_case_like("ПрИвЕт", "монони"), "монони");
        assert_eq!(apply_case_like("пРИВЕТ", "Монони"), "Монони");
    }

    // ========== Translation Tests ==========

    #[test]
    fn test_scenario_capitalized_greeting() {
        let translator = simple(&[("привет", "монони")], FallbackPolicy::KeepOriginal);
        assert_eq!(translator.translate("Привет!"), "Монони!");
    }

    #[test]
    fn test_all_caps_and_yo_folding() {
        let translator = simple(&[("елка", "гуня")], FallbackPolicy::KeepOriginal);
        assert_eq!(translator.translate("ЁЛКА"), "ГУНЯ");
        assert_eq!(translator.translate("ёлка"), "гуня");
    }

    #[test]
    fn test_empty_lexicon_keep_original_is_cleanup() {
        let translator = simple(&[], FallbackPolicy::KeepOriginal);
        let inputs = ["Привет ,  мир !", "  (текст )  ", "раз.два", "ok"];
        for input in inputs {
            assert_eq!(translator.translate(input), cleanup_spacing(input));
        }
    }

    #[test]
    fn test_empty_input() {
        let translator = simple(&[("привет", "монони")], FallbackPolicy::DropUnknown);
        assert_eq!(translator.translate(""), "");
    }

    #[test]
    fn test_no_letters_returned_after_cleanup() {
        let translator = simple(&[], FallbackPolicy::DropUnknown);
        assert_eq!(translator.translate(" 42 , 7 "), "42, 7");
    }

    #[test]
    fn test_drop_unknown_leaves_no_letters() {
        let translator = simple(&[], FallbackPolicy::DropUnknown);
        let result = translator.translate_detailed("привет мир");
        assert!(!has_letters(&result.text));
        assert_eq!(result.resolved, 0);
        assert_eq!(result.unresolved, 2);
    }

    #[test]
    fn test_drop_unknown_no_double_spaces() {
        let translator = simple(&[("мама", "нюка")], FallbackPolicy::DropUnknown);
        let result = translator.translate("мама очень любит папу , да");
        assert_eq!(result, "нюка,");
        let result = translator.translate("я и мама");
        assert_eq!(result, "нюка");
        assert!(!translator.translate("а б мама в г мама").contains("  "));
    }

    #[test]
    fn test_mark_unknown_brackets() {
        let translator = simple(&[("мир", "жобо")], FallbackPolicy::MarkUnknown);
        assert_eq!(translator.translate("Привет, мир"), "⟦Привет⟧, жобо");
    }

    #[test]
    fn test_lemma_fallback() {
        let translator = translator_with(
            &[("мама", "нюка")],
            FallbackPolicy::KeepOriginal,
            true,
            lemma_table(&[("мамы", "мама")]),
        );
        assert_eq!(translator.translate("Мамы"), "Нюка");
    }

    #[test]
    fn test_direct_form_beats_lemma() {
        let translator = translator_with(
            &[("мама", "нюка"), ("мамы", "нюкани")],
            FallbackPolicy::KeepOriginal,
            true,
            lemma_table(&[("мамы", "мама")]),
        );
        assert_eq!(translator.translate("мамы"), "нюкани");
    }

    #[test]
    fn test_lemma_ignored_when_lemmatize_off() {
        let translator = translator_with(
            &[("мама", "нюка")],
            FallbackPolicy::KeepOriginal,
            false,
            lemma_table(&[("мамы", "мама")]),
        );
        assert_eq!(translator.translate("мамы"), "мамы");
    }

    #[test]
    fn test_missing_oracle_degrades_to_form() {
        let translator = translator_with(
            &[("мама", "нюка")],
            FallbackPolicy::MarkUnknown,
            true,
            Arc::new(NullMorphology),
        );
        assert_eq!(translator.translate("мама мамы"), "нюка ⟦мамы⟧");
    }

    #[test]
    fn test_sentence_spacing_after_translation() {
        let translator = simple(
            &[("привет", "монони"), ("друг", "губожя")],
            FallbackPolicy::KeepOriginal,
        );
        assert_eq!(translator.translate("Привет,друг!"), "Монони, губожя!");
    }

    #[test]
    fn test_translation_does_not_mutate_lexicon() {
        let translator = simple(&[("привет", "монони")], FallbackPolicy::KeepOriginal);
        let _ = translator.translate("Привет мир");
        assert_eq!(translator.lexicon().len(), 1);
    }
}
