//! Statistics generation from the scrape database
//!
//! This module provides functionality for extracting and displaying
//! statistics about stored records and runs.

use crate::crawler::{detail_paths, DetailField};
use crate::storage::{RunRecord, Storage};
use crate::ScrapeError;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct ScrapeStatistics {
    /// Total number of stored records
    pub total_records: u64,

    /// Number of records missing each content field, in field order
    pub missing_fields: Vec<(DetailField, u64)>,

    /// Number of runs recorded
    pub total_runs: u64,

    /// The most recent run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn Storage) -> Result<ScrapeStatistics, ScrapeError> {
    let total_records = storage.count_records()?;

    let missing_fields = detail_paths()
        .into_iter()
        .map(|(field, _)| Ok((field, storage.count_missing_field(field)?)))
        .collect::<Result<Vec<_>, ScrapeError>>()?;

    Ok(ScrapeStatistics {
        total_records,
        missing_fields,
        total_runs: storage.count_runs()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &ScrapeStatistics) {
    println!("=== Scrape Statistics ===\n");

    println!("Records: {}", stats.total_records);
    println!("Runs: {}", stats.total_runs);
    println!();

    if stats.total_records > 0 {
        println!("Field Coverage:");
        for (field, missing) in &stats.missing_fields {
            let present = stats.total_records.saturating_sub(*missing);
            let percentage = (present as f64 / stats.total_records as f64) * 100.0;
            println!(
                "  {:<18} {:>6} present, {:>6} absent ({:.1}%)",
                field.name(),
                present,
                missing,
                percentage
            );
        }
        println!();
    }

    if let Some(run) = &stats.latest_run {
        println!("Latest Run (#{}):", run.id);
        println!("  Keyword: {}", run.keyword);
        println!("  Status: {}", run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Pages walked: {}", run.pages_walked);
        println!("  Records inserted: {}", run.records_inserted);
        println!("  Duplicates skipped: {}", run.duplicates);
        println!("  Failures: {}", run.failures);
        if let Some(error) = &run.error_message {
            println!("  Error: {}", error);
        }
    }
}
