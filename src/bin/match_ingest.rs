use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use match_plots::config::{self, AppConfig};
use match_plots::ingest;
use match_plots::logging;
use match_plots::store::SqliteMatchStore;

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_stderr_logging();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let sources = parse_sources(&args);
    if sources.is_empty() {
        return Err(anyhow!(
            "usage: match_ingest [--db <path>] <documents.json|documents.jsonl>..."
        ));
    }

    let db_path = match config::db_path_arg(&args).context("invalid --db argument")? {
        Some(path) => path,
        None => AppConfig::from_env().context("read configuration")?.db_path,
    };
    let store = SqliteMatchStore::open(&db_path)?;

    let mut total_read = 0usize;
    let mut total_upserted = 0usize;
    for source in &sources {
        let summary = ingest::ingest_file(&store, source)?;
        total_read += summary.documents_read;
        total_upserted += summary.documents_upserted;
        println!(
            "{}: read={} upserted={}",
            source.display(),
            summary.documents_read,
            summary.documents_upserted
        );
        if !summary.errors.is_empty() {
            println!("  errors: {}", summary.errors.len());
            for err in summary.errors.iter().take(8) {
                println!("   - {err}");
            }
        }
    }

    println!("Match ingest complete");
    println!("DB: {}", db_path.display());
    println!("Documents read: {total_read}");
    println!("Documents upserted: {total_upserted}");
    println!("Documents stored: {}", store.document_count()?);
    Ok(())
}

fn parse_sources(args: &[String]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg == "--db" {
            skip_next = true;
            continue;
        }
        if arg.starts_with("--") {
            continue;
        }
        out.push(PathBuf::from(arg));
    }
    out
}
