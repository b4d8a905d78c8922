//! Crawler module for the search-result walk
//!
//! This module contains the core scraping logic, including:
//! - HTTP fetching with the session cookie
//! - Listing and detail page extraction
//! - Bounded concurrent detail resolution
//! - The page-by-page walk and record persistence

mod extractor;
mod fetcher;
mod pool;
mod record;
mod walker;
mod worker;

pub use extractor::{
    detail_paths, DetailField, ExtractError, ExtractResult, Extractor, LIST_CONTAINER_PATH,
    NEXT_LINK_PATH,
};
pub use fetcher::{build_http_client, Fetcher};
pub use pool::{WorkerPool, DEFAULT_POOL_SIZE};
pub use record::{DetailFields, ListingPage, Record, ResultStub};
pub use walker::{PageWalker, WalkSummary};
pub use worker::DetailWorker;

use crate::config::Config;
use crate::storage::{open_storage, Storage};
use crate::ScrapeError;
use std::path::Path;

/// Runs a complete scrape
///
/// This is the main entry point. It will:
/// 1. Open the store and record a new run
/// 2. Walk the listing pages, resolving and persisting each page's results
/// 3. Mark the run completed, or failed with the aborting error
///
/// The store is opened for the duration of this call only and closed on
/// every exit path.
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `config_hash` - Hash of the config file, stored with the run
pub async fn scrape(config: &Config, config_hash: &str) -> Result<WalkSummary, ScrapeError> {
    let storage = open_storage(Path::new(&config.output.database_path))?;
    run_scrape(config, config_hash, &storage).await
}

/// Runs a scrape against an already opened store
pub async fn run_scrape<S: Storage>(
    config: &Config,
    config_hash: &str,
    storage: &S,
) -> Result<WalkSummary, ScrapeError> {
    let fetcher = Fetcher::new(&config.session, &config.scraper)?;
    let mut walker = PageWalker::new(
        fetcher,
        storage,
        config.scraper.max_pages,
        config.scraper.max_concurrent_details as usize,
    )?;

    let run_id = storage.create_run(config_hash, &config.session.keyword)?;
    tracing::info!("Run {}: searching '{}'", run_id, config.session.keyword);

    match walker.run().await {
        Ok(summary) => {
            storage.complete_run(run_id, &summary)?;
            Ok(summary)
        }
        Err(e) => {
            if let Err(storage_err) = storage.fail_run(run_id, &walker.summary(), &e.to_string()) {
                tracing::error!("Could not mark run {} as failed: {}", run_id, storage_err);
            }
            Err(e)
        }
    }
}
