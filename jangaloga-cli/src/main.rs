use clap::{Arg, ArgMatches, Command};
use jangaloga::dictionary_build::{BuildOptions, build_dictionary, load_seed, load_word_list};
use jangaloga::translator::has_letters;
use jangaloga::{JgError, JgResult, Lexicon, PartOfSpeech, Translator, generate, morphology};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

fn cli() -> Command {
    let dict_arg = Arg::new("dict")
        .long("dict")
        .short('d')
        .help("Lexicon document")
        .default_value("dictionary.json");
    let lemmas_arg = Arg::new("lemmas")
        .long("lemmas")
        .short('l')
        .help("Lemma table (JSON: form -> {lemma, pos}) enabling lemmatization");

    Command::new("jangaloga")
        .version("0.1.0")
        .about("Russian to Jangaloga dictionary tools")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("translate")
                .about("Translate a UTF-8 text file")
                .arg(
                    Arg::new("in")
                        .long("in")
                        .short('i')
                        .help("Russian input file")
                        .required(true),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .help("Jangaloga output file")
                        .required(true),
                )
                .arg(dict_arg.clone())
                .arg(lemmas_arg.clone()),
        )
        .subcommand(
            Command::new("add")
                .about("Add or overwrite one lexicon entry")
                .arg(
                    Arg::new("ru")
                        .help("Russian word")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("jg")
                        .help("Jangaloga word")
                        .required(true)
                        .index(2),
                )
                .arg(dict_arg.clone()),
        )
        .subcommand(
            Command::new("build")
                .about("Build a dictionary from a seed and a frequency list")
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .help("Seed document")
                        .default_value("dictionary_seed.json"),
                )
                .arg(
                    Arg::new("words")
                        .long("words")
                        .short('w')
                        .help("Frequency list, one word per line, most frequent first")
                        .required(true),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .short('o')
                        .help("Output document")
                        .default_value("dictionary.json"),
                )
                .arg(
                    Arg::new("n")
                        .long("n")
                        .short('n')
                        .help("Target total dictionary size")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("3000"),
                )
                .arg(lemmas_arg),
        )
        .subcommand(
            Command::new("generate")
                .about("Preview the pseudo-word generated for a Russian word")
                .arg(
                    Arg::new("word")
                        .help("Russian word")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("pos")
                        .long("pos")
                        .short('p')
                        .help("Part of speech hint")
                        .value_parser(["verb", "adj", "adjective", "noun"]),
                )
                .arg(dict_arg),
        )
}

fn path_arg(matches: &ArgMatches, name: &str) -> Option<PathBuf> {
    matches.get_one::<String>(name).map(PathBuf::from)
}

fn required_path(matches: &ArgMatches, name: &str) -> JgResult<PathBuf> {
    path_arg(matches, name).ok_or_else(|| JgError::Config(format!("--{} is required", name)))
}

/// Translate `input` into `output` with the lexicon at `dict`
///
/// Unlike the serving path, a missing lexicon is an error here.
fn translate_file(
    input: &Path,
    output: &Path,
    dict: &Path,
    lemmas: Option<&Path>,
) -> JgResult<usize> {
    if !dict.exists() {
        return Err(JgError::Config(format!(
            "Lexicon not found: {}",
            dict.display()
        )));
    }
    let text = fs::read_to_string(input)
        .map_err(|e| JgError::Io(format!("Failed to read '{}': {}", input.display(), e)))?;

    let lexicon = Lexicon::load(dict)?;
    let translator = Translator::new(Arc::new(lexicon), morphology::select(lemmas));
    let translation = translator.translate_detailed(&text);
    if !has_letters(&translation.text) {
        return Err(JgError::Validation(
            "Nothing translatable: the result contains no words".to_string(),
        ));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, format!("{}\n", translation.text))?;
    info!(
        resolved = translation.resolved,
        unresolved = translation.unresolved,
        "Translated file"
    );
    Ok(translation.text.chars().count())
}

fn add_entry(dict: &Path, ru: &str, jg: &str) -> JgResult<usize> {
    let mut lexicon = Lexicon::load(dict)?;
    lexicon.add(ru, jg)?;
    Ok(lexicon.len())
}

fn build(
    seed_path: &Path,
    words_path: &Path,
    out: &Path,
    target_size: usize,
    lemmas: Option<&Path>,
) -> JgResult<usize> {
    let seed = load_seed(seed_path)?;
    let words = load_word_list(words_path)?;
    let oracle = morphology::select(lemmas);
    let options = BuildOptions {
        target_size,
        source_seed: seed_path.display().to_string(),
    };

    let document = build_dictionary(
        &seed,
        words.iter().map(String::as_str),
        oracle.as_ref(),
        &options,
    )?;
    document.write_atomic(out)?;
    Ok(document.ru_to_jg.len())
}

fn preview(word: &str, pos: Option<&str>, dict: &Path) -> JgResult<String> {
    let reserved: HashSet<String> = if dict.exists() {
        Lexicon::load(dict)?.values().map(str::to_string).collect()
    } else {
        HashSet::new()
    };
    generate(word, &reserved, pos.and_then(PartOfSpeech::parse))
}

fn run(matches: &ArgMatches) -> JgResult<()> {
    match matches.subcommand() {
        Some(("translate", sub)) => {
            let input = required_path(sub, "in")?;
            let output = required_path(sub, "out")?;
            let dict = required_path(sub, "dict")?;
            let lemmas = path_arg(sub, "lemmas");
            let chars = translate_file(&input, &output, &dict, lemmas.as_deref())?;
            println!("OK: {} ({} chars)", output.display(), chars);
        }
        Some(("add", sub)) => {
            let dict = required_path(sub, "dict")?;
            let ru = sub.get_one::<String>("ru").map(String::as_str).unwrap_or("");
            let jg = sub.get_one::<String>("jg").map(String::as_str).unwrap_or("");
            let total = add_entry(&dict, ru, jg)?;
            println!("Added: {} -> {} ({} entries)", ru, jg, total);
        }
        Some(("build", sub)) => {
            let seed = required_path(sub, "seed")?;
            let words = required_path(sub, "words")?;
            let out = required_path(sub, "out")?;
            let n = sub.get_one::<usize>("n").copied().unwrap_or(3000);
            let lemmas = path_arg(sub, "lemmas");
            let size = build(&seed, &words, &out, n, lemmas.as_deref())?;
            println!("Saved: {} entries={}", out.display(), size);
        }
        Some(("generate", sub)) => {
            let word = sub.get_one::<String>("word").map(String::as_str).unwrap_or("");
            let pos = sub.get_one::<String>("pos").map(String::as_str);
            let dict = required_path(sub, "dict")?;
            println!("{}", preview(word, pos, &dict)?);
        }
        _ => return Err(JgError::Config("Unknown command".to_string())),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    if let Err(e) = run(&matches) {
        eprintln!("❌ {}", e);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jangaloga::LexiconDocument;

    fn write_dict(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("dictionary.json");
        fs::write(&path, json).unwrap();
        path
    }

    // ========== Argument Tests ==========

    #[test]
    fn test_cli_definition_is_valid() {
        cli().debug_assert();
    }

    #[test]
    fn test_translate_args_parse() {
        let matches = cli()
            .try_get_matches_from(["jangaloga", "translate", "--in", "a.txt", "--out", "b.txt"])
            .unwrap();
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "translate");
        assert_eq!(path_arg(sub, "dict"), Some(PathBuf::from("dictionary.json")));
        assert_eq!(path_arg(sub, "lemmas"), None);
    }

    #[test]
    fn test_build_size_must_be_a_number() {
        assert!(
            cli()
                .try_get_matches_from(["jangaloga", "build", "--words", "w.txt", "--n", "many"])
                .is_err()
        );
    }

    // ========== Command Tests ==========

    #[test]
    fn test_translate_file() {
        let dir = tempfile::tempdir().unwrap();
        let dict = write_dict(dir.path(), r#"{"ru_to_jg": {"привет": "монони"}}"#);
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out/result.txt");
        fs::write(&input, "Привет!").unwrap();

        translate_file(&input, &output, &dict, None).unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "Монони!\n");
    }

    #[test]
    fn test_translate_requires_lexicon() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        fs::write(&input, "Привет!").unwrap();

        let result = translate_file(
            &input,
            &dir.path().join("out.txt"),
            &dir.path().join("missing.json"),
            None,
        );
        assert!(matches!(result, Err(JgError::Config(_))));
    }

    #[test]
    fn test_translate_rejects_letterless_result() {
        let dir = tempfile::tempdir().unwrap();
        let dict = write_dict(
            dir.path(),
            r#"{"ru_to_jg": {}, "fallback_policy": "drop_unknown"}"#,
        );
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out.txt");
        fs::write(&input, "привет мир").unwrap();

        let result = translate_file(&input, &output, &dict, None);
        assert!(matches!(result, Err(JgError::Validation(_))));
        assert!(!output.exists());
    }

    #[test]
    fn test_add_creates_document() {
        let dir = tempfile::tempdir().unwrap();
        let dict = dir.path().join("dictionary.json");

        assert_eq!(add_entry(&dict, "Привет", "монони").unwrap(), 1);
        let saved: LexiconDocument =
            serde_json::from_str(&fs::read_to_string(&dict).unwrap()).unwrap();
        assert_eq!(saved.ru_to_jg.get("привет").map(String::as_str), Some("монони"));
    }

    #[test]
    fn test_build_writes_target_size() {
        let dir = tempfile::tempdir().unwrap();
        let seed = dir.path().join("seed.json");
        fs::write(&seed, r#"{"ru_to_jg": {"привет": "монони"}}"#).unwrap();
        let words = dir.path().join("words.txt");
        fs::write(&words, "дом 100\nкот 90\nлес 80\n").unwrap();
        let out = dir.path().join("dictionary.json");

        assert_eq!(build(&seed, &words, &out, 5, None).unwrap(), 5);
        let saved: LexiconDocument =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(saved.ru_to_jg.get("привет").map(String::as_str), Some("монони"));
    }

    #[test]
    fn test_preview_avoids_existing_words() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("none.json");
        let first = preview("мама", None, &missing).unwrap();

        let dict = write_dict(
            dir.path(),
            &format!(r#"{{"ru_to_jg": {{"папа": "{}"}}}}"#, first),
        );
        let second = preview("мама", None, &dict).unwrap();
        assert_ne!(first, second);
    }
}
