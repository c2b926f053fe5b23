use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use wordfreq_morph::{Lexicon, LoadMode, Morphology};

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let lexicon_path = args
        .next()
        .map(PathBuf::from)
        .context("usage: cargo run -p wordfreq-morph --example analyze -- <lexicon.tsv> <word>...")?;

    let lexicon = Lexicon::load_with_mode(&lexicon_path, LoadMode::Mmap)
        .with_context(|| format!("loading lexicon from {}", lexicon_path.display()))?;
    println!("Lexicon: {} ({} forms)", lexicon_path.display(), lexicon.len());

    for word in args {
        match lexicon.analyze(&word) {
            Ok(analysis) => {
                let category = analysis
                    .category
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "?".into());
                println!("{word:<15} -> {:<15} {category}", analysis.lemma);
                for parse in lexicon.parses(&word).iter().skip(1) {
                    println!("{:<15}    also {:<10} {:?}", "", parse.lemma, parse.category);
                }
            }
            Err(err) => println!("{word:<15} !! {err}"),
        }
    }

    Ok(())
}
