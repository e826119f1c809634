use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use serde_json::Value;

use crate::document::MatchDocument;
use crate::store::SqliteMatchStore;

#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub db_path: Option<PathBuf>,
    pub documents_read: usize,
    pub documents_upserted: usize,
    pub errors: Vec<String>,
}

/// Parses either a JSON array of documents or one document per line
/// (`mongoexport` style). Bad entries are reported, not fatal.
pub fn parse_documents(raw: &str) -> (Vec<MatchDocument>, Vec<String>) {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return (Vec::new(), Vec::new());
    }

    if trimmed.starts_with('[') {
        return match serde_json::from_str::<Vec<Value>>(trimmed) {
            Ok(items) => split_results(
                items
                    .into_par_iter()
                    .enumerate()
                    .map(|(idx, item)| {
                        serde_json::from_value::<MatchDocument>(item)
                            .map_err(|err| format!("entry {idx}: {err}"))
                    })
                    .collect(),
            ),
            Err(err) => (Vec::new(), vec![format!("invalid json array: {err}")]),
        };
    }

    let lines = trimmed
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .collect::<Vec<_>>();
    split_results(
        lines
            .into_par_iter()
            .map(|(idx, line)| {
                serde_json::from_str::<MatchDocument>(line.trim())
                    .map_err(|err| format!("line {}: {err}", idx + 1))
            })
            .collect(),
    )
}

fn split_results(results: Vec<Result<MatchDocument, String>>) -> (Vec<MatchDocument>, Vec<String>) {
    let mut docs = Vec::with_capacity(results.len());
    let mut errors = Vec::new();
    for result in results {
        match result {
            Ok(doc) => docs.push(doc),
            Err(err) => errors.push(err),
        }
    }
    (docs, errors)
}

pub fn ingest_file(store: &SqliteMatchStore, source: &Path) -> Result<IngestSummary> {
    let raw = fs::read_to_string(source)
        .with_context(|| format!("read match documents from {}", source.display()))?;
    let (docs, errors) = parse_documents(&raw);
    if docs.is_empty() && !errors.is_empty() {
        return Err(anyhow!(
            "no readable documents in {} ({} errors, first: {})",
            source.display(),
            errors.len(),
            errors[0]
        ));
    }
    ingest_documents(store, &source.display().to_string(), &docs, errors)
}

pub fn ingest_documents(
    store: &SqliteMatchStore,
    source: &str,
    docs: &[MatchDocument],
    errors: Vec<String>,
) -> Result<IngestSummary> {
    let documents_upserted = store.upsert_documents(docs)?;
    let documents_read = docs.len() + errors.len();
    store.record_ingest_run(source, documents_read, documents_upserted, &errors)?;
    tracing::info!(
        source,
        read = documents_read,
        upserted = documents_upserted,
        errors = errors.len(),
        "ingest finished"
    );
    Ok(IngestSummary {
        db_path: store.path().map(Path::to_path_buf),
        documents_read,
        documents_upserted,
        errors,
    })
}
