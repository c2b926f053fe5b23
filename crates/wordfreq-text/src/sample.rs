use std::cell::OnceCell;
use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use tracing::{debug, warn};
use wordfreq_morph::{MorphError, Morphology};
use wordfreq_types::{Category, WordRecord};

use crate::tokenizer::Tokenizer;

#[derive(Debug, Error)]
pub enum SampleError {
    #[error("input contains no alphabetic tokens")]
    EmptyInput,
    #[error("morphological analysis failed for {form:?}")]
    Analysis {
        form: String,
        #[source]
        source: MorphError,
    },
}

/// What to do when the analyzer rejects a form.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum FailurePolicy {
    /// Fail the whole word list.
    #[default]
    Abort,
    /// Drop the form and keep going.
    Skip,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PipelineOptions {
    pub on_failure: FailurePolicy,
}

/// Tokenizer and analyzer bundled for building samples.
pub struct Pipeline<T, M> {
    tokenizer: T,
    morphology: M,
    options: PipelineOptions,
}

impl<T: Tokenizer, M: Morphology> Pipeline<T, M> {
    pub fn new(tokenizer: T, morphology: M) -> Self {
        Self {
            tokenizer,
            morphology,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    pub fn morphology(&self) -> &M {
        &self.morphology
    }

    pub fn sample(&self, text: impl Into<String>) -> Result<Sample<'_>, SampleError> {
        Sample::new(text, &self.tokenizer, &self.morphology, self.options)
    }
}

/// One analyzed text.
///
/// Holds the normalized token sequence: tokens starting with a letter,
/// lowercased, in source order. The word list is computed on the first call
/// to [`Sample::words`] and cached.
pub struct Sample<'a> {
    text: String,
    tokens: Vec<String>,
    morphology: &'a dyn Morphology,
    options: PipelineOptions,
    words: OnceCell<Vec<WordRecord>>,
}

impl<'a> Sample<'a> {
    pub fn new(
        text: impl Into<String>,
        tokenizer: &dyn Tokenizer,
        morphology: &'a dyn Morphology,
        options: PipelineOptions,
    ) -> Result<Self, SampleError> {
        let text = text.into();
        let raw = tokenizer.tokenize(&text);
        let raw_count = raw.len();
        let tokens: Vec<String> = raw
            .into_iter()
            .filter(|t| t.chars().next().is_some_and(char::is_alphabetic))
            .map(str::to_lowercase)
            .collect();
        debug!(
            "{} tokenizer: {raw_count} raw tokens, {} kept",
            tokenizer.name(),
            tokens.len()
        );
        if tokens.is_empty() {
            return Err(SampleError::EmptyInput);
        }

        Ok(Self {
            text,
            tokens,
            morphology,
            options,
            words: OnceCell::new(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Normalized tokens in source order, duplicates included.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// One record per distinct form, in order of first occurrence.
    ///
    /// The analyzer is called once per distinct form. A failed call is not
    /// cached; the next call starts over.
    pub fn words(&self) -> Result<&[WordRecord], SampleError> {
        if let Some(words) = self.words.get() {
            return Ok(words);
        }
        let words = self.analyze()?;
        Ok(self.words.get_or_init(|| words))
    }

    fn analyze(&self) -> Result<Vec<WordRecord>, SampleError> {
        let mut distinct: Vec<(&str, u32)> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        for token in &self.tokens {
            let slot = *slots.entry(token.as_str()).or_insert_with(|| {
                distinct.push((token.as_str(), 0));
                distinct.len() - 1
            });
            distinct[slot].1 = distinct[slot].1.saturating_add(1);
        }

        let mut words = Vec::with_capacity(distinct.len());
        for (form, frequency) in distinct {
            let analysis = match self.morphology.analyze(form) {
                Ok(analysis) => analysis,
                Err(source) => match self.options.on_failure {
                    FailurePolicy::Abort => {
                        return Err(SampleError::Analysis {
                            form: form.to_string(),
                            source,
                        });
                    }
                    FailurePolicy::Skip => {
                        warn!("skipping {form:?}: {source}");
                        continue;
                    }
                },
            };
            words.push(WordRecord::new(
                form,
                analysis.lemma,
                analysis.category.unwrap_or(Category::Unknown),
                frequency,
            ));
        }

        debug!(
            "analyzed {} distinct forms from {} tokens",
            words.len(),
            self.tokens.len()
        );
        Ok(words)
    }
}

impl fmt::Debug for Sample<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("tokens", &self.tokens)
            .field("options", &self.options)
            .field("analyzed", &self.words.get().is_some())
            .finish_non_exhaustive()
    }
}
