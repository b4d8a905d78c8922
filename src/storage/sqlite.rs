//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the `Storage` and
//! `RecordSink` traits. The connection sits behind a mutex so that one
//! storage value can be shared by every task of a run.

use crate::crawler::{DetailField, DetailFields, Record, WalkSummary};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{InsertOutcome, RecordSink, Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use crate::ScrapeError;
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const RECORD_COLUMNS: &str = "identifier, url, title, issuing_reference, publish_date,
    effective_date, issuing_authority, legal_tier, body_text";

const RUN_COLUMNS: &str = "id, started_at, finished_at, config_hash, keyword, status,
    pages_walked, records_inserted, duplicates, failures, error_message";

/// SQLite storage backend
///
/// The connection is closed when the value is dropped.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(ScrapeError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, ScrapeError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, ScrapeError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))
    }

    fn finish_run(
        &self,
        run_id: i64,
        status: RunStatus,
        summary: &WalkSummary,
        error: Option<&str>,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn()?.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, pages_walked = ?3,
             records_inserted = ?4, duplicates = ?5, failures = ?6, error_message = ?7
             WHERE id = ?8",
            params![
                status.to_db_string(),
                now,
                summary.pages_walked,
                summary.records_inserted as i64,
                summary.duplicates as i64,
                summary.failures() as i64,
                error,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }
}

fn encode_lines(lines: &Option<Vec<String>>) -> StorageResult<Option<String>> {
    lines
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| StorageError::Serialization(e.to_string()))
}

fn decode_lines(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<Vec<String>>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|json| {
        serde_json::from_str(&json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
    })
    .transpose()
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<Record> {
    Ok(Record {
        identifier: row.get(0)?,
        url: row.get(1)?,
        title: row.get(2)?,
        fields: DetailFields {
            issuing_reference: decode_lines(row, 3)?,
            publish_date: decode_lines(row, 4)?,
            effective_date: decode_lines(row, 5)?,
            issuing_authority: decode_lines(row, 6)?,
            legal_tier: decode_lines(row, 7)?,
            body_text: decode_lines(row, 8)?,
        },
    })
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        keyword: row.get(4)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(5)?)
            .unwrap_or(RunStatus::Failed),
        pages_walked: row.get(6)?,
        records_inserted: row.get::<_, i64>(7)? as u64,
        duplicates: row.get::<_, i64>(8)? as u64,
        failures: row.get::<_, i64>(9)? as u64,
        error_message: row.get(10)?,
    })
}

impl RecordSink for SqliteStorage {
    fn insert_if_absent(&self, record: &Record) -> StorageResult<InsertOutcome> {
        let fields = &record.fields;
        let now = Utc::now().to_rfc3339();

        let inserted = self.conn()?.execute(
            &format!(
                "INSERT INTO records ({RECORD_COLUMNS}, scraped_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(identifier) DO NOTHING"
            ),
            params![
                record.identifier,
                record.url,
                record.title,
                encode_lines(&fields.issuing_reference)?,
                encode_lines(&fields.publish_date)?,
                encode_lines(&fields.effective_date)?,
                encode_lines(&fields.issuing_authority)?,
                encode_lines(&fields.legal_tier)?,
                encode_lines(&fields.body_text)?,
                now
            ],
        )?;

        if inserted == 0 {
            Ok(InsertOutcome::AlreadyExists)
        } else {
            Ok(InsertOutcome::Inserted)
        }
    }
}

impl Storage for SqliteStorage {
    // ===== Run Management =====

    fn create_run(&self, config_hash: &str, keyword: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO runs (started_at, config_hash, keyword, status) VALUES (?1, ?2, ?3, ?4)",
            params![now, config_hash, keyword, RunStatus::Running.to_db_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn()?
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM runs WHERE id = ?1"),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn()?
            .query_row(
                &format!("SELECT {RUN_COLUMNS} FROM runs ORDER BY id DESC LIMIT 1"),
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    fn complete_run(&self, run_id: i64, summary: &WalkSummary) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Completed, summary, None)
    }

    fn fail_run(&self, run_id: i64, summary: &WalkSummary, error: &str) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed, summary, Some(error))
    }

    fn count_runs(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Records =====

    fn get_record(&self, identifier: &str) -> StorageResult<Option<Record>> {
        let record = self
            .conn()?
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM records WHERE identifier = ?1"),
                params![identifier],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn all_records(&self) -> StorageResult<Vec<Record>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM records ORDER BY scraped_at, identifier"
        ))?;

        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_missing_field(&self, field: DetailField) -> StorageResult<u64> {
        let count: i64 = self.conn()?.query_row(
            &format!("SELECT COUNT(*) FROM records WHERE {} IS NULL", field.name()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
