//! Text side of the pipeline: split raw text into tokens, normalize them, and
//! turn a sample into deduplicated, frequency-annotated [`WordRecord`]s.
//!
//! ```rust
//! use wordfreq_morph::Lexicon;
//! use wordfreq_text::{Pipeline, UnicodeTokenizer};
//!
//! let pipeline = Pipeline::new(UnicodeTokenizer::default(), Lexicon::empty());
//! let sample = pipeline.sample("Дощ. Дощ йде.").unwrap();
//! let words = sample.words().unwrap();
//! assert_eq!(words[0].form, "дощ");
//! assert_eq!(words[0].frequency, 2);
//! ```
//!
//! [`WordRecord`]: wordfreq_types::WordRecord

pub mod sample;
pub mod tokenizer;

pub use sample::{FailurePolicy, Pipeline, PipelineOptions, Sample, SampleError};
pub use tokenizer::{Tokenizer, UnicodeTokenizer};
