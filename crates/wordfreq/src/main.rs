use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use wordfreq::{Cli, Config, run};

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let json = cli.json;
    let config = Config::from(cli);
    info!("using store at {}", config.location);
    match &config.lexicon {
        Some(path) => info!(
            "using lexicon at {} (mode: {:?})",
            path.display(),
            config.lexicon_mode
        ),
        None => info!("no lexicon given"),
    }

    let report = run(&config)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let max_level = env_filter
        .max_level_hint()
        .and_then(|hint| hint.into_level())
        .unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .with_max_level(max_level)
        .init();
}
