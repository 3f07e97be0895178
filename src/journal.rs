//! Optional SQLite ledger of runs and per-track outcomes.
//!
//! The journal is write-only from the pipeline's point of view: nothing in a
//! run reads it back, so the cached lookup stays the only idempotence guard.

use rusqlite::{params, Connection};
use std::path::Path;
use std::time::Duration;

use crate::error::JournalError;
use crate::models::{ArchiveStatus, ProcessingOutcome, RunSummary, TrackReport};

pub struct RunJournal {
    conn: Connection,
    run_id: i64,
}

impl RunJournal {
    pub fn open(path: &Path, dry_run: bool) -> Result<Self, JournalError> {
        let mut conn = Connection::open(path)?;
        init_db(&mut conn)?;
        Self::start(conn, dry_run)
    }

    pub fn open_in_memory(dry_run: bool) -> Result<Self, JournalError> {
        let mut conn = Connection::open_in_memory()?;
        init_db(&mut conn)?;
        Self::start(conn, dry_run)
    }

    fn start(conn: Connection, dry_run: bool) -> Result<Self, JournalError> {
        conn.execute(
            "INSERT INTO runs (started_at, dry_run) VALUES (?1, ?2)",
            params![now_unix(), dry_run],
        )?;
        let run_id = conn.last_insert_rowid();
        Ok(Self { conn, run_id })
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn record(&self, report: &TrackReport) -> Result<(), JournalError> {
        let source = match &report.outcome {
            ProcessingOutcome::Published { source } => Some(source.as_str()),
            _ => None,
        };
        let reason = match &report.outcome {
            ProcessingOutcome::Failed(reason) => Some(reason.to_string()),
            _ => None,
        };
        let archive_detail = match &report.archive {
            ArchiveStatus::Archived { audio, .. } => Some(audio.display().to_string()),
            ArchiveStatus::Failed(msg) | ArchiveStatus::Partial(msg) => Some(msg.clone()),
            ArchiveStatus::NotApplicable | ArchiveStatus::Skipped => None,
        };

        self.conn.execute(
            r#"
            INSERT INTO outcomes
              (run_id, path, artist, title, outcome, source, reason, archive, archive_detail, recorded_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                self.run_id,
                report.path.to_string_lossy().to_string(),
                report.artist,
                report.title,
                report.outcome.label(),
                source,
                reason,
                report.archive.label(),
                archive_detail,
                now_unix(),
            ],
        )?;
        Ok(())
    }

    pub fn finish(&self, summary: &RunSummary) -> Result<(), JournalError> {
        self.conn.execute(
            "UPDATE runs SET finished_at=?1, exit_code=?2 WHERE id=?3",
            params![now_unix(), summary.exit_code(), self.run_id],
        )?;
        Ok(())
    }

    /// (outcome label, count) for this run, sorted by label.
    pub fn outcome_counts(&self) -> Result<Vec<(String, i64)>, JournalError> {
        let mut stmt = self.conn.prepare(
            "SELECT outcome, COUNT(*) FROM outcomes WHERE run_id=?1 GROUP BY outcome ORDER BY outcome",
        )?;
        let rows = stmt.query_map(params![self.run_id], |row| Ok((row.get(0)?, row.get(1)?)))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

fn init_db(conn: &mut Connection) -> Result<(), JournalError> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(
        r#"
        PRAGMA journal_mode=WAL;
        PRAGMA synchronous=NORMAL;

        CREATE TABLE IF NOT EXISTS runs (
          id          INTEGER PRIMARY KEY AUTOINCREMENT,
          started_at  INTEGER NOT NULL,
          finished_at INTEGER,
          dry_run     INTEGER NOT NULL,
          exit_code   INTEGER
        );

        CREATE TABLE IF NOT EXISTS outcomes (
          run_id         INTEGER NOT NULL REFERENCES runs(id),
          path           TEXT NOT NULL,
          artist         TEXT,
          title          TEXT,
          outcome        TEXT NOT NULL,
          source         TEXT,
          reason         TEXT,
          archive        TEXT NOT NULL,
          archive_detail TEXT,
          recorded_at    INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_outcomes_path ON outcomes(path);
        "#,
    )?;
    Ok(())
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_secs() as i64
}
