use std::env;

use anyhow::{Context, Result};
use wordfreq_db::{Location, OpenOptions, WordStore};

fn main() -> Result<()> {
    let location: Location = env::args()
        .nth(1)
        .map(|s| Location::from(s.as_str()))
        .context("usage: cargo run -p wordfreq-db --example dump -- <path-to-db>")?;

    let mut store = WordStore::open_with(location.clone(), OpenOptions { read_only: true })
        .with_context(|| format!("opening {location}"))?;

    let records = store.select_all()?;
    println!("Store  : {location}");
    println!("Records: {}", records.len());
    for rec in &records {
        println!("  {rec}");
    }

    println!("By category:");
    for (category, count) in store.aggregate_by_category()? {
        println!("  {category:<8} {count}");
    }

    store.close()?;
    Ok(())
}
