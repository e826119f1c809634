use std::path::PathBuf;

use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;

use match_plots::config::{self, AppConfig};
use match_plots::demo;
use match_plots::ingest;
use match_plots::logging;
use match_plots::store::SqliteMatchStore;

const DEFAULT_SEED: u64 = 2026;
const DEFAULT_SEASON: &str = "2025/2026";

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_stderr_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let db_path = match config::db_path_arg(&args).context("invalid --db argument")? {
        Some(path) => path,
        None => AppConfig::from_env().context("read configuration")?.db_path,
    };
    let seed = arg_value(&args, "--seed")
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(DEFAULT_SEED);
    let season = arg_value(&args, "--season").unwrap_or_else(|| DEFAULT_SEASON.to_string());

    let mut rng = StdRng::seed_from_u64(seed);
    let docs = demo::demo_documents(&mut rng, &season);

    let store = SqliteMatchStore::open(&db_path)?;
    let summary = ingest::ingest_documents(&store, "seed_demo", &docs, Vec::new())?;

    println!("Demo store ready");
    println!(
        "DB: {}",
        summary
            .db_path
            .unwrap_or_else(|| PathBuf::from(":memory:"))
            .display()
    );
    println!("Season: {season} (seed {seed})");
    println!("Matches upserted: {}", summary.documents_upserted);
    Ok(())
}

fn arg_value(args: &[String], name: &str) -> Option<String> {
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
