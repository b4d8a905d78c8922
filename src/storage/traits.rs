//! Storage traits and error types
//!
//! `RecordSink` is the narrow interface the page walker writes through;
//! `Storage` adds the run bookkeeping and queries used by the binary.

use crate::crawler::{DetailField, Record, WalkSummary};
use crate::storage::RunRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// What happened to a record handed to the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The record was new and has been stored
    Inserted,

    /// A record with the same identifier was already stored; nothing changed
    AlreadyExists,
}

/// Destination for scraped records
///
/// Implementations must be safe to share between tasks; they serialize
/// access to the underlying store themselves.
pub trait RecordSink: Send + Sync {
    /// Stores `record` unless its identifier is already present
    ///
    /// An existing record is never overwritten.
    fn insert_if_absent(&self, record: &Record) -> StorageResult<InsertOutcome>;
}

/// Full storage backend used by the scraper binary
pub trait Storage: RecordSink {
    // ===== Run Management =====

    /// Creates a new run in the `running` state and returns its ID
    fn create_run(&self, config_hash: &str, keyword: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as completed and records its totals
    fn complete_run(&self, run_id: i64, summary: &WalkSummary) -> StorageResult<()>;

    /// Marks a run as failed with the error that aborted it
    fn fail_run(&self, run_id: i64, summary: &WalkSummary, error: &str) -> StorageResult<()>;

    /// Counts all runs
    fn count_runs(&self) -> StorageResult<u64>;

    // ===== Records =====

    /// Gets a record by identifier
    fn get_record(&self, identifier: &str) -> StorageResult<Option<Record>>;

    /// Gets all records, oldest first
    fn all_records(&self) -> StorageResult<Vec<Record>>;

    /// Counts stored records
    fn count_records(&self) -> StorageResult<u64>;

    /// Counts records where `field` was absent
    fn count_missing_field(&self, field: DetailField) -> StorageResult<u64>;
}
