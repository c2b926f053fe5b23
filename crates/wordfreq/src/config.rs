use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use wordfreq_db::Location;
use wordfreq_morph::LoadMode;
use wordfreq_text::FailurePolicy;

pub const DEFAULT_DB: &str = "wordfreq.db";
pub const DEFAULT_FORM: &str = "дощ";
pub const SAMPLE_TEXT: &str = "
    Надворі дощ і сильний вітер.
    Небо затягнуте хмарами, а на вулиці йде сильний дощ.
    Це гарна погода для того, щоб залишитися вдома з чашкою гарячого чаю.
";

#[derive(Debug, Parser)]
#[command(name = "wordfreq")]
#[command(version, about = "Count word forms in a text, store them, and query the store")]
pub struct Cli {
    /// Text file to analyze; `-` reads stdin. Uses a built-in sample when omitted.
    pub input: Option<PathBuf>,

    /// Analyze this text instead of a file.
    #[arg(long, conflicts_with = "input")]
    pub text: Option<String>,

    /// Database file, or `:memory:`.
    #[arg(long, env = "WORDFREQ_DB", default_value = DEFAULT_DB)]
    pub db: String,

    /// Tab-separated `form<TAB>lemma<TAB>TAG` lexicon.
    #[arg(long, env = "WORDFREQ_LEXICON")]
    pub lexicon: Option<PathBuf>,

    #[arg(long, env = "WORDFREQ_LEXICON_MODE", default_value = "mmap", value_parser = parse_load_mode)]
    pub lexicon_mode: LoadMode,

    /// Form to look up after loading.
    #[arg(long, default_value = DEFAULT_FORM)]
    pub form: String,

    /// Overwrite the looked-up form's frequency.
    #[arg(long)]
    pub set_frequency: Option<u32>,

    /// Drop forms the analyzer rejects instead of failing.
    #[arg(long)]
    pub skip_unanalyzable: bool,

    /// Split `word-word` into separate tokens.
    #[arg(long)]
    pub no_hyphen_join: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Input {
    Text(String),
    File(PathBuf),
    Stdin,
    Sample,
}

impl Input {
    pub fn read(&self) -> Result<String> {
        match self {
            Input::Text(text) => Ok(text.clone()),
            Input::File(path) => std::fs::read_to_string(path)
                .with_context(|| format!("read input {}", path.display())),
            Input::Stdin => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("read input from stdin")?;
                Ok(buf)
            }
            Input::Sample => Ok(SAMPLE_TEXT.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub input: Input,
    pub location: Location,
    pub lexicon: Option<PathBuf>,
    pub lexicon_mode: LoadMode,
    pub form: String,
    pub set_frequency: Option<u32>,
    pub on_failure: FailurePolicy,
    pub join_hyphens: bool,
}

impl Config {
    /// Defaults for analyzing `input` into the store at `location`.
    pub fn new(input: Input, location: impl Into<Location>) -> Self {
        Self {
            input,
            location: location.into(),
            lexicon: None,
            lexicon_mode: LoadMode::Mmap,
            form: DEFAULT_FORM.to_string(),
            set_frequency: None,
            on_failure: FailurePolicy::Abort,
            join_hyphens: true,
        }
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let input = match (cli.text, cli.input) {
            (Some(text), _) => Input::Text(text),
            (None, Some(path)) if path.as_os_str() == "-" => Input::Stdin,
            (None, Some(path)) => Input::File(path),
            (None, None) => Input::Sample,
        };
        Self {
            input,
            location: Location::from(cli.db.as_str()),
            lexicon: cli.lexicon,
            lexicon_mode: cli.lexicon_mode,
            form: cli.form,
            set_frequency: cli.set_frequency,
            on_failure: if cli.skip_unanalyzable {
                FailurePolicy::Skip
            } else {
                FailurePolicy::Abort
            },
            join_hyphens: !cli.no_hyphen_join,
        }
    }
}

fn parse_load_mode(raw: &str) -> Result<LoadMode, String> {
    match raw.to_ascii_lowercase().as_str() {
        "mmap" => Ok(LoadMode::Mmap),
        "owned" => Ok(LoadMode::Owned),
        other => Err(format!("unknown load mode {other:?} (expected mmap or owned)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        let argv = std::iter::once("wordfreq").chain(args.iter().copied());
        Config::from(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn defaults_to_sample_text() {
        let config = parse(&["--db", "w.db"]);
        assert_eq!(config.input, Input::Sample);
        assert_eq!(config.location, Location::File("w.db".into()));
        assert_eq!(config.form, DEFAULT_FORM);
        assert_eq!(config.on_failure, FailurePolicy::Abort);
        assert!(config.join_hyphens);
        assert_eq!(config.set_frequency, None);
    }

    #[test]
    fn reads_flags() {
        let config = parse(&[
            "--db",
            ":memory:",
            "--text",
            "Дощ йде",
            "--lexicon",
            "uk.tsv",
            "--lexicon-mode",
            "OWNED",
            "--form",
            "йде",
            "--set-frequency",
            "7",
            "--skip-unanalyzable",
            "--no-hyphen-join",
        ]);
        assert_eq!(config.input, Input::Text("Дощ йде".into()));
        assert_eq!(config.location, Location::Memory);
        assert_eq!(config.lexicon, Some(PathBuf::from("uk.tsv")));
        assert_eq!(config.lexicon_mode, LoadMode::Owned);
        assert_eq!(config.form, "йде");
        assert_eq!(config.set_frequency, Some(7));
        assert_eq!(config.on_failure, FailurePolicy::Skip);
        assert!(!config.join_hyphens);
    }

    #[test]
    fn dash_means_stdin() {
        assert_eq!(parse(&["--db", "w.db", "-"]).input, Input::Stdin);
        assert_eq!(
            parse(&["--db", "w.db", "text.txt"]).input,
            Input::File("text.txt".into())
        );
    }

    #[test]
    fn rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["wordfreq", "--lexicon-mode", "paged"]).is_err());
        assert!(Cli::try_parse_from(["wordfreq", "--set-frequency", "-1"]).is_err());
        assert!(Cli::try_parse_from(["wordfreq", "a.txt", "--text", "x"]).is_err());
    }
}
