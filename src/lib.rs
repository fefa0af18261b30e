//! Dictionary-driven Russian to Jangaloga translation
//!
//! Jangaloga is a constructed language whose vocabulary lives in a single
//! JSON lexicon. This crate provides:
//!
//! - [`lexicon`]: loading, validating and atomically saving the lexicon
//! - [`generator`]: deterministic pseudo-words for new entries
//! - [`translator`]: token-level translation with case transfer
//! - [`dictionary_build`]: offline bulk generation from a word list
//! - [`pipeline`]: the single-flight voice/text message pipeline
//!
//! # Example
//!
//! ```ignore
//! use jangaloga::{Lexicon, Translator, morphology};
//! use std::sync::Arc;
//!
//! let lexicon = Lexicon::load("dictionary.json")?;
//! let translator = Translator::new(Arc::new(lexicon), morphology::select(None));
//! assert_eq!(translator.translate("Привет!"), "Монони!");
//! ```

pub mod dictionary_build;
pub mod error;
pub mod generator;
pub mod lexicon;
pub mod morphology;
pub mod pipeline;
pub mod translator;

pub use error::{JgError, JgResult};
pub use generator::generate;
pub use lexicon::{FallbackPolicy, LANGUAGE_NAME, Lexicon, LexiconDocument, normalize_word};
pub use morphology::{Analysis, MorphologyOracle, NullMorphology, PartOfSpeech};
pub use translator::{Translation, Translator};
