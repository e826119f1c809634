use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, params, params_from_iter};

use crate::document::{MatchDocument, Venue};
use crate::error::StoreError;

/// Projection used to build team directories: country, league and the team
/// name at one venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRow {
    pub country: String,
    pub league: String,
    pub name: String,
}

/// Read side of the match store.
pub trait MatchStore: Send + Sync {
    /// First document whose home and away names match exactly.
    fn find_match(&self, home: &str, away: &str) -> Result<Option<MatchDocument>, StoreError>;

    /// Team projection for every document outside `exclude`, in storage order.
    fn team_rows(&self, venue: Venue, exclude: &[String]) -> Result<Vec<TeamRow>, StoreError>;

    fn distinct_team_names(&self, venue: Venue) -> Result<Vec<String>, StoreError>;

    fn distinct_leagues(&self, exclude: &[String]) -> Result<Vec<String>, StoreError>;
}

pub struct SqliteMatchStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl SqliteMatchStore {
    /// Opens an existing store without creating it; the dashboard never writes.
    pub fn open_read_only(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(|err| {
            StoreError::Connectivity(format!("open sqlite db {}: {err}", path.display()))
        })?;
        // Fail at start rather than on the first submit.
        conn.query_row("SELECT COUNT(*) FROM match_documents", [], |row| {
            row.get::<_, i64>(0)
        })
        .map_err(|err| {
            StoreError::Connectivity(format!("sqlite db {} not readable: {err}", path.display()))
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Opens (creating if needed) a store for ingest.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create store dir {}", parent.display()))?;
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Connectivity("store lock poisoned".to_string()))
    }

    pub fn document_count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM match_documents", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    /// Inserts documents in one transaction. Returns the number written.
    pub fn upsert_documents(&self, docs: &[MatchDocument]) -> Result<usize> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        let tx = conn.transaction().context("begin ingest transaction")?;
        let mut written = 0usize;
        for doc in docs {
            upsert_document(&tx, doc)?;
            written += 1;
        }
        tx.commit().context("commit ingest transaction")?;
        Ok(written)
    }

    pub fn record_ingest_run(
        &self,
        source: &str,
        documents_read: usize,
        documents_upserted: usize,
        errors: &[String],
    ) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("store lock poisoned"))?;
        let errors_json = serde_json::to_string(errors).unwrap_or_else(|_| "[]".to_string());
        conn.execute(
            "INSERT INTO ingest_runs(finished_at, source, documents_read, documents_upserted, errors_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                Utc::now().to_rfc3339(),
                source,
                documents_read as i64,
                documents_upserted as i64,
                errors_json
            ],
        )
        .context("insert ingest run")?;
        Ok(())
    }
}

impl MatchStore for SqliteMatchStore {
    fn find_match(&self, home: &str, away: &str) -> Result<Option<MatchDocument>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT doc_id, body FROM match_documents
                 WHERE home_name = ?1 AND away_name = ?2
                 ORDER BY doc_id
                 LIMIT 1",
                params![home, away],
                |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;
        let Some((doc_id, body)) = row else {
            return Ok(None);
        };
        let doc = serde_json::from_str::<MatchDocument>(&body).map_err(|err| {
            StoreError::Decode {
                doc_id,
                reason: err.to_string(),
            }
        })?;
        Ok(Some(doc))
    }

    fn team_rows(&self, venue: Venue, exclude: &[String]) -> Result<Vec<TeamRow>, StoreError> {
        let name_col = venue_column(venue);
        let sql = format!(
            "SELECT country, league, {name_col} FROM match_documents{} ORDER BY doc_id",
            not_in_clause("country", exclude.len())
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(exclude.iter()), |row| {
                Ok(TeamRow {
                    country: row.get(0)?,
                    league: row.get(1)?,
                    name: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn distinct_team_names(&self, venue: Venue) -> Result<Vec<String>, StoreError> {
        let name_col = venue_column(venue);
        let sql = format!("SELECT DISTINCT {name_col} FROM match_documents ORDER BY {name_col}");
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    fn distinct_leagues(&self, exclude: &[String]) -> Result<Vec<String>, StoreError> {
        let sql = format!(
            "SELECT DISTINCT league FROM match_documents{} ORDER BY league",
            not_in_clause("country", exclude.len())
        );
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let leagues = stmt
            .query_map(params_from_iter(exclude.iter()), |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(leagues)
    }
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS match_documents (
            doc_id INTEGER PRIMARY KEY AUTOINCREMENT,
            home_name TEXT NOT NULL,
            away_name TEXT NOT NULL,
            country TEXT NOT NULL,
            league TEXT NOT NULL,
            season TEXT NOT NULL,
            body TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(home_name, away_name, season)
        );
        CREATE INDEX IF NOT EXISTS idx_match_documents_pair ON match_documents(home_name, away_name);
        CREATE INDEX IF NOT EXISTS idx_match_documents_country ON match_documents(country);

        CREATE TABLE IF NOT EXISTS ingest_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            finished_at TEXT NOT NULL,
            source TEXT NOT NULL,
            documents_read INTEGER NOT NULL,
            documents_upserted INTEGER NOT NULL,
            errors_json TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn upsert_document(tx: &Transaction<'_>, doc: &MatchDocument) -> Result<()> {
    let body = serde_json::to_string(doc).context("serialize match document")?;
    tx.execute(
        "INSERT INTO match_documents(home_name, away_name, country, league, season, body, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(home_name, away_name, season) DO UPDATE SET
            country = excluded.country,
            league = excluded.league,
            body = excluded.body,
            updated_at = excluded.updated_at",
        params![
            doc.home_name(),
            doc.away_name(),
            doc.general.country,
            doc.general.league,
            doc.general.season,
            body,
            Utc::now().to_rfc3339()
        ],
    )
    .with_context(|| format!("upsert {} vs {}", doc.home_name(), doc.away_name()))?;
    Ok(())
}

fn venue_column(venue: Venue) -> &'static str {
    match venue {
        Venue::Home => "home_name",
        Venue::Away => "away_name",
    }
}

fn not_in_clause(column: &str, count: usize) -> String {
    if count == 0 {
        return String::new();
    }
    let placeholders = (1..=count)
        .map(|idx| format!("?{idx}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(" WHERE {column} NOT IN ({placeholders})")
}
