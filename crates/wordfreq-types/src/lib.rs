//! Shared types for word-frequency analysis.
//!
//! A [`WordRecord`] is one distinct surface form seen in a text sample,
//! together with its lemma, coarse part of speech ([`Category`]) and the
//! number of times it occurred. Records are produced by the analysis pipeline
//! and persisted by the store; the store assigns [`WordRecord::id`].
//!
//! ```rust
//! use wordfreq_types::{Category, WordRecord};
//!
//! let rec = WordRecord::new("дощ", "дощ", Category::Noun, 2);
//! assert_eq!(rec.id, None);
//! assert_eq!(Category::from_tag("ADJF"), Some(Category::Adj));
//! assert_eq!(Category::Unknown.to_string(), "UNKNOWN");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse grammatical category assigned to a word form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Category {
    Noun,
    Verb,
    Adj,
    Adv,
    Pron,
    Num,
    Prep,
    Conj,
    Part,
    Intj,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 11] = [
        Category::Noun,
        Category::Verb,
        Category::Adj,
        Category::Adv,
        Category::Pron,
        Category::Num,
        Category::Prep,
        Category::Conj,
        Category::Part,
        Category::Intj,
        Category::Unknown,
    ];

    /// Parse a tag as written in lexicon files or in the `pos` column.
    ///
    /// Besides the canonical tags this accepts the OpenCorpora aliases used by
    /// Ukrainian dictionaries (`ADJF`, `NPRO`, `INFN`, ...). Matching ignores
    /// ASCII case.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim().to_ascii_uppercase();
        let cat = match tag.as_str() {
            "NOUN" => Category::Noun,
            "VERB" | "INFN" | "GRND" | "PRTF" | "PRTS" => Category::Verb,
            "ADJ" | "ADJF" | "ADJS" | "COMP" => Category::Adj,
            "ADV" | "ADVB" | "PRED" => Category::Adv,
            "PRON" | "NPRO" => Category::Pron,
            "NUM" | "NUMR" => Category::Num,
            "PREP" => Category::Prep,
            "CONJ" => Category::Conj,
            "PART" | "PRCL" => Category::Part,
            "INTJ" => Category::Intj,
            "UNKNOWN" => Category::Unknown,
            _ => return None,
        };
        Some(cat)
    }

    /// Tag stored in the `pos` column.
    pub fn as_tag(self) -> &'static str {
        match self {
            Category::Noun => "NOUN",
            Category::Verb => "VERB",
            Category::Adj => "ADJ",
            Category::Adv => "ADV",
            Category::Pron => "PRON",
            Category::Num => "NUM",
            Category::Prep => "PREP",
            Category::Conj => "CONJ",
            Category::Part => "PART",
            Category::Intj => "INTJ",
            Category::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_tag())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown part-of-speech tag {0:?}")]
pub struct UnknownTag(pub String);

impl FromStr for Category {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_tag(s).ok_or_else(|| UnknownTag(s.to_string()))
    }
}

impl From<Category> for &'static str {
    fn from(cat: Category) -> Self {
        cat.as_tag()
    }
}

impl TryFrom<String> for Category {
    type Error = UnknownTag;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// One distinct word form with its analysis and frequency.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WordRecord {
    /// Surrogate key assigned by the store; `None` until persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub form: String,
    pub lemma: String,
    pub category: Category,
    pub frequency: u32,
}

impl WordRecord {
    pub fn new(
        form: impl Into<String>,
        lemma: impl Into<String>,
        category: Category,
        frequency: u32,
    ) -> Self {
        Self {
            id: None,
            form: form.into(),
            lemma: lemma.into(),
            category,
            frequency,
        }
    }

    /// Same record tagged with a store-assigned id.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

impl fmt::Display for WordRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = self.id {
            write!(f, "#{id:<5} ")?;
        }
        write!(
            f,
            "{:<15} {:<15} {:<8} {}",
            self.form, self.lemma, self.category, self.frequency
        )
    }
}
