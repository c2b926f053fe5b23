//! Morphological analysis: word form in, lemma and part of speech out.
//!
//! The pipeline only depends on the [`Morphology`] trait, so any analyzer can
//! be plugged in. [`Lexicon`] is the bundled implementation, built on the same
//! plan as WordNet's morphy:
//!
//! 1. Look the form up in the lexicon; the first listed parse wins.
//! 2. Otherwise strip inflectional suffixes per category and keep the first
//!    candidate lemma the lexicon knows for that category.
//! 3. Otherwise fall back to the form itself with no category.
//!
//! # Example
//! ```no_run
//! use wordfreq_morph::{LoadMode, Lexicon, Morphology};
//!
//! # fn main() -> anyhow::Result<()> {
//! let lex = Lexicon::load_with_mode("/path/to/lexicon.tsv", LoadMode::Mmap)?;
//! let analysis = lex.analyze("хмари")?;
//! println!("{} {:?}", analysis.lemma, analysis.category);
//! # Ok(()) }
//! ```
//!
//! For a runnable demo, see `cargo run -p wordfreq-morph --example analyze -- <lexicon> <word>...`.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;
use thiserror::Error;
use tracing::{debug, info};
use wordfreq_types::Category;

/// Lemma and category for a single token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Analysis {
    pub lemma: String,
    /// `None` when the analyzer could not decide.
    pub category: Option<Category>,
}

impl Analysis {
    pub fn new(lemma: impl Into<String>, category: Option<Category>) -> Self {
        Self {
            lemma: lemma.into(),
            category,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MorphError {
    #[error("cannot analyze {token:?}: {reason}")]
    Unanalyzable { token: String, reason: String },
}

/// Token → (lemma, category) capability.
pub trait Morphology {
    fn analyze(&self, token: &str) -> Result<Analysis, MorphError>;
}

impl<M: Morphology + ?Sized> Morphology for &M {
    fn analyze(&self, token: &str) -> Result<Analysis, MorphError> {
        (**self).analyze(token)
    }
}

impl<M: Morphology + ?Sized> Morphology for Box<M> {
    fn analyze(&self, token: &str) -> Result<Analysis, MorphError> {
        (**self).analyze(token)
    }
}

/// Strategy for reading the lexicon file.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum LoadMode {
    /// Memory-map the file.
    #[default]
    Mmap,
    /// Read the file into an owned buffer.
    Owned,
}

enum Buffer {
    Mmap(Mmap),
    Owned(Vec<u8>),
}

impl Buffer {
    fn as_slice(&self) -> &[u8] {
        match self {
            Buffer::Mmap(m) => m.as_ref(),
            Buffer::Owned(v) => v.as_slice(),
        }
    }
}

/// Dictionary of known forms plus suffix rules for unknown ones.
#[derive(Clone, Debug, Default)]
pub struct Lexicon {
    forms: HashMap<String, Vec<Analysis>>,
    lemmas: HashSet<(Category, String)>,
}

impl Lexicon {
    /// Lexicon with no entries; every token goes through the fallback.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load a tab-separated `form<TAB>lemma<TAB>TAG` file, memory-mapped.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_mode(path, LoadMode::Mmap)
    }

    /// Load a lexicon choosing between mmap and an owned buffer.
    pub fn load_with_mode(path: impl AsRef<Path>, mode: LoadMode) -> Result<Self> {
        let path = path.as_ref();
        let buffer = load_file(path, mode)?;
        let lexicon = parse_lexicon(buffer.as_slice())
            .with_context(|| format!("parse lexicon {}", path.display()))?;
        info!(
            "loaded {} forms ({} lemmas) from {} (mode: {:?})",
            lexicon.forms.len(),
            lexicon.lemmas.len(),
            path.display(),
            mode
        );
        Ok(lexicon)
    }

    /// Build a lexicon from `(form, lemma, category)` triples, in order.
    pub fn from_entries<I, F, L>(entries: I) -> Self
    where
        I: IntoIterator<Item = (F, L, Category)>,
        F: AsRef<str>,
        L: AsRef<str>,
    {
        let mut lexicon = Self::default();
        for (form, lemma, category) in entries {
            lexicon.insert(form.as_ref(), lemma.as_ref(), category);
        }
        lexicon
    }

    fn insert(&mut self, form: &str, lemma: &str, category: Category) {
        let lemma = normalize(lemma);
        self.lemmas.insert((category, lemma.clone()));
        self.forms
            .entry(normalize(form))
            .or_default()
            .push(Analysis::new(lemma, Some(category)));
    }

    /// Number of distinct forms.
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Whether `lemma` is listed as a lemma of the given category.
    pub fn lemma_exists(&self, category: Category, lemma: &str) -> bool {
        self.lemmas.contains(&(category, normalize(lemma)))
    }

    /// All parses listed for a form, in file order.
    pub fn parses(&self, form: &str) -> &[Analysis] {
        self.forms
            .get(&normalize(form))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn guess(&self, form: &str) -> Option<Analysis> {
        for category in [Category::Noun, Category::Verb, Category::Adj] {
            for (suffix, replacement) in rules_for(category) {
                if let Some(candidate) = apply_rule(form, suffix, replacement)
                    && self.lemma_exists(category, &candidate)
                {
                    debug!("{form}: -{suffix} +{replacement} -> {candidate} ({category})");
                    return Some(Analysis::new(candidate, Some(category)));
                }
            }
        }
        None
    }
}

impl Morphology for Lexicon {
    fn analyze(&self, token: &str) -> Result<Analysis, MorphError> {
        let form = normalize(token);
        if form.is_empty() {
            return Err(MorphError::Unanalyzable {
                token: token.to_string(),
                reason: "empty token".into(),
            });
        }
        if form.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(MorphError::Unanalyzable {
                token: token.to_string(),
                reason: "token contains whitespace or control characters".into(),
            });
        }

        if let Some(first) = self.forms.get(&form).and_then(|parses| parses.first()) {
            return Ok(first.clone());
        }
        if let Some(guess) = self.guess(&form) {
            return Ok(guess);
        }
        Ok(Analysis::new(form, None))
    }
}

fn load_file(path: &Path, mode: LoadMode) -> Result<Buffer> {
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let len = file
        .metadata()
        .with_context(|| format!("stat {}", path.display()))?
        .len();
    match mode {
        // Zero-length files cannot be mapped.
        LoadMode::Mmap if len > 0 => unsafe { Mmap::map(&file) }
            .map(Buffer::Mmap)
            .with_context(|| format!("mmap {}", path.display())),
        _ => {
            let mut buf = Vec::new();
            file.read_to_end(&mut buf)
                .with_context(|| format!("read {}", path.display()))?;
            Ok(Buffer::Owned(buf))
        }
    }
}

fn parse_lexicon(bytes: &[u8]) -> Result<Lexicon> {
    let mut lexicon = Lexicon::default();
    for (lineno, raw_line) in bytes.split(|b| *b == b'\n').enumerate() {
        let line = std::str::from_utf8(strip_cr(raw_line))
            .with_context(|| format!("line {} is not valid utf-8", lineno + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split('\t').map(str::trim).collect();
        if fields.len() < 3 || fields[..3].iter().any(|f| f.is_empty()) {
            anyhow::bail!("line {}: expected form<TAB>lemma<TAB>tag", lineno + 1);
        }
        let category = Category::from_tag(fields[2])
            .ok_or_else(|| anyhow::anyhow!("line {}: unknown tag {:?}", lineno + 1, fields[2]))?;
        lexicon.insert(fields[0], fields[1], category);
    }
    Ok(lexicon)
}

fn strip_cr(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

fn apply_rule(form: &str, suffix: &str, replacement: &str) -> Option<String> {
    let stem = form.strip_suffix(suffix)?;
    if stem.is_empty() {
        return None;
    }
    Some(format!("{stem}{replacement}"))
}

fn rules_for(category: Category) -> &'static [(&'static str, &'static str)] {
    match category {
        Category::Noun => &[
            ("ові", ""),
            ("ами", ""),
            ("ами", "а"),
            ("ями", "я"),
            ("ом", ""),
            ("ем", ""),
            ("ом", "о"),
            ("ах", ""),
            ("ах", "а"),
            ("ях", "я"),
            ("ам", "а"),
            ("ям", "я"),
            ("ою", "а"),
            ("ею", "я"),
            ("ів", ""),
            ("и", ""),
            ("и", "а"),
            ("і", ""),
            ("і", "а"),
            ("і", "я"),
            ("і", "о"),
            ("у", ""),
            ("у", "а"),
            ("ю", ""),
            ("ю", "я"),
            ("ю", "й"),
            ("я", "й"),
            ("а", ""),
            ("а", "о"),
        ],
        Category::Verb => &[
            ("ують", "ути"),
            ("ує", "ути"),
            ("юють", "ювати"),
            ("ює", "ювати"),
            ("ають", "ати"),
            ("ає", "ати"),
            ("ить", "ити"),
            ("ять", "ити"),
            ("ать", "ати"),
            ("уть", "ти"),
            ("ла", "ти"),
            ("ло", "ти"),
            ("ли", "ти"),
            ("в", "ти"),
            ("е", "ти"),
        ],
        Category::Adj => &[
            ("ього", "ій"),
            ("ого", "ий"),
            ("ому", "ий"),
            ("ими", "ий"),
            ("им", "ий"),
            ("их", "ий"),
            ("ій", "ий"),
            ("ої", "ий"),
            ("ою", "ий"),
            ("у", "ий"),
            ("а", "ий"),
            ("е", "ий"),
            ("і", "ий"),
            ("я", "ій"),
            ("є", "ій"),
        ],
        _ => &[],
    }
}
