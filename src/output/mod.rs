//! Output module for reporting on stored data
//!
//! This module handles:
//! - Field coverage and run statistics (`--stats`)
//! - Exporting records as JSON Lines (`--export`)

mod export;
pub mod stats;

pub use export::{export_records, write_records_jsonl};
pub use stats::{load_statistics, print_statistics, ScrapeStatistics};
