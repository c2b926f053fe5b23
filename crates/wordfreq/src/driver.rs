use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use wordfreq_db::WordStore;
use wordfreq_morph::Lexicon;
use wordfreq_text::{Pipeline, PipelineOptions, UnicodeTokenizer};
use wordfreq_types::{Category, WordRecord};

use crate::config::Config;

/// Everything one run produced, in the order the steps ran.
#[derive(Debug, Serialize)]
pub struct Report {
    pub location: String,
    pub token_count: usize,
    pub words: Vec<WordRecord>,
    pub inserted: usize,
    pub by_category: BTreeMap<Category, usize>,
    pub form: String,
    pub lookup: Vec<WordRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<FrequencyUpdate>,
}

#[derive(Debug, Serialize)]
pub struct FrequencyUpdate {
    pub frequency: u32,
    pub affected: usize,
    pub lookup: Vec<WordRecord>,
}

/// Analyze the configured input, replace the store contents with the result,
/// then run the aggregation, lookup and optional update against it.
pub fn run(config: &Config) -> Result<Report> {
    let text = config.input.read()?;

    let lexicon = match &config.lexicon {
        Some(path) => Lexicon::load_with_mode(path, config.lexicon_mode)
            .with_context(|| format!("loading lexicon from {}", path.display()))?,
        None => {
            warn!("no lexicon configured; lemmas fall back to surface forms");
            Lexicon::empty()
        }
    };
    let tokenizer = UnicodeTokenizer {
        join_hyphens: config.join_hyphens,
    };
    let pipeline = Pipeline::new(tokenizer, lexicon).with_options(PipelineOptions {
        on_failure: config.on_failure,
    });

    let start = Instant::now();
    let sample = pipeline.sample(text)?;
    let words = sample.words()?.to_vec();
    info!(
        "analyzed {} tokens into {} forms in {} ms",
        sample.token_count(),
        words.len(),
        start.elapsed().as_millis()
    );

    let mut store = WordStore::open(config.location.clone())?;
    let inserted = store.bulk_load(&words)?;
    let by_category = store.aggregate_by_category()?;
    let lookup = store.lookup_by_form(&config.form)?;

    let update = match config.set_frequency {
        Some(frequency) => {
            let affected = store.update_frequency(&config.form, frequency)?;
            if affected == 0 {
                warn!("{:?} not stored; nothing updated", config.form);
            }
            Some(FrequencyUpdate {
                frequency,
                affected,
                lookup: store.lookup_by_form(&config.form)?,
            })
        }
        None => None,
    };
    store.close()?;

    Ok(Report {
        location: config.location.to_string(),
        token_count: sample.token_count(),
        words,
        inserted,
        by_category,
        form: config.form.clone(),
        lookup,
        update,
    })
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Analyzed {} tokens, {} distinct forms:",
            self.token_count,
            self.words.len()
        )?;
        for word in &self.words {
            writeln!(f, "  {word}")?;
        }

        writeln!(f, "\nInserted {} records into {}", self.inserted, self.location)?;

        writeln!(f, "\nRecords per category:")?;
        for (category, count) in &self.by_category {
            writeln!(f, "  {category:<8} {count}")?;
        }

        writeln!(f, "\nLookup {:?}:", self.form)?;
        write_rows(f, &self.lookup)?;

        if let Some(update) = &self.update {
            if update.affected == 0 {
                writeln!(f, "\nNo record to update for {:?}", self.form)?;
            } else {
                writeln!(
                    f,
                    "\nSet frequency of {:?} to {} ({} rows)",
                    self.form, update.frequency, update.affected
                )?;
            }
            writeln!(f, "\nLookup {:?} after update:", self.form)?;
            write_rows(f, &update.lookup)?;
        }
        Ok(())
    }
}

fn write_rows(f: &mut fmt::Formatter<'_>, rows: &[WordRecord]) -> fmt::Result {
    if rows.is_empty() {
        return writeln!(f, "  not found");
    }
    for row in rows {
        writeln!(f, "  {row}")?;
    }
    Ok(())
}
