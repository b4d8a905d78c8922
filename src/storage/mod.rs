//! Storage module for persisting scraped records
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Idempotent record insertion keyed by document identifier
//! - Run tracking (start, completion, failure, totals)

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{InsertOutcome, RecordSink, Storage, StorageError, StorageResult};

use crate::ScrapeError;

use std::path::Path;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(ScrapeError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> Result<SqliteStorage, ScrapeError> {
    SqliteStorage::new(path)
}

/// Represents a scrape run in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub keyword: String,
    pub status: RunStatus,
    pub pages_walked: u32,
    pub records_inserted: u64,
    pub duplicates: u64,
    pub failures: u64,
    pub error_message: Option<String>,
}

/// Status of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
