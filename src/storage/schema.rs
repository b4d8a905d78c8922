//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the scrape database.

/// SQL schema for the database
///
/// Optional document fields hold a JSON array of text lines, or NULL when the
/// field was absent on the detail page.
pub const SCHEMA_SQL: &str = r#"
-- Track scrape runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    keyword TEXT NOT NULL,
    status TEXT NOT NULL,
    pages_walked INTEGER NOT NULL DEFAULT 0,
    records_inserted INTEGER NOT NULL DEFAULT 0,
    duplicates INTEGER NOT NULL DEFAULT 0,
    failures INTEGER NOT NULL DEFAULT 0,
    error_message TEXT
);

-- Scraped documents, one row per site identifier
CREATE TABLE IF NOT EXISTS records (
    identifier TEXT PRIMARY KEY,
    url TEXT NOT NULL,
    title TEXT NOT NULL,
    issuing_reference TEXT,
    publish_date TEXT,
    effective_date TEXT,
    issuing_authority TEXT,
    legal_tier TEXT,
    body_text TEXT,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_scraped_at ON records(scraped_at);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
