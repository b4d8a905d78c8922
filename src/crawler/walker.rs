//! Page walker - main scrape orchestration logic
//!
//! Walks the search-result listing one page at a time:
//! - Fetches the listing page (the configured search URL first, then the
//!   next-page link of the previous page)
//! - Extracts the result stubs and the next-page link
//! - Resolves every stub through the bounded worker pool
//! - Persists the page's records before moving on
//!
//! Pages are strictly sequential. The walk stops after `max_pages` listing
//! pages, on a listing page with no results, or on the first fatal fetch or
//! extraction error.

use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::pool::WorkerPool;
use crate::crawler::record::{Record, ResultStub};
use crate::crawler::worker::DetailWorker;
use crate::state::WalkState;
use crate::storage::{InsertOutcome, RecordSink};
use crate::ScrapeError;
use std::sync::Arc;
use std::time::Instant;

/// Totals for one walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    /// Listing pages fetched and fully processed
    pub pages_walked: u32,

    /// Records newly written to the store
    pub records_inserted: u64,

    /// Records skipped because their identifier was already stored
    pub duplicates: u64,

    /// Stubs whose detail page could not be fetched
    pub detail_failures: u64,

    /// Records the store refused for reasons other than a duplicate key
    pub sink_failures: u64,
}

impl WalkSummary {
    /// Records lost to detail or store failures
    pub fn failures(&self) -> u64 {
        self.detail_failures + self.sink_failures
    }
}

/// Drives the listing-page loop
pub struct PageWalker<'a, S: RecordSink> {
    fetcher: Fetcher,
    extractor: Arc<Extractor>,
    worker: DetailWorker,
    sink: &'a S,
    max_pages: u32,
    pool_size: usize,
    state: WalkState,
    summary: WalkSummary,
}

impl<'a, S: RecordSink> PageWalker<'a, S> {
    /// Creates a walker
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Authenticated fetcher for the site
    /// * `sink` - Where records are written
    /// * `max_pages` - Number of listing pages to walk
    /// * `pool_size` - Maximum detail pages fetched at once
    pub fn new(
        fetcher: Fetcher,
        sink: &'a S,
        max_pages: u32,
        pool_size: usize,
    ) -> Result<Self, ScrapeError> {
        let extractor = Arc::new(Extractor::new().map_err(|source| ScrapeError::Extract {
            url: fetcher.base_url().to_string(),
            source,
        })?);
        let worker = DetailWorker::new(fetcher.clone(), Arc::clone(&extractor));

        Ok(Self {
            fetcher,
            extractor,
            worker,
            sink,
            max_pages,
            pool_size,
            state: WalkState::Start,
            summary: WalkSummary::default(),
        })
    }

    /// Current state of the walk
    pub fn state(&self) -> WalkState {
        self.state
    }

    /// Totals so far; after a failed walk these are the partial totals
    pub fn summary(&self) -> WalkSummary {
        self.summary
    }

    /// Runs the walk to completion
    ///
    /// # Returns
    ///
    /// * `Ok(WalkSummary)` - The page cap was reached, or a listing page came
    ///   back with no result items at all and the walk stopped early
    /// * `Err(ScrapeError)` - A listing page could not be fetched, or its list
    ///   container or next-page link was missing; records persisted for
    ///   earlier pages stay in the store
    ///
    /// A result item that cannot be read is skipped and counted as a detail
    /// failure; the rest of its page is still processed.
    pub async fn run(&mut self) -> Result<WalkSummary, ScrapeError> {
        let mut url: Option<String> = None;
        let mut page: u32 = 1;
        let start_time = Instant::now();

        tracing::info!("Starting walk of up to {} pages", self.max_pages);

        while !self.state.is_terminal() {
            let page_start = Instant::now();
            tracing::info!("Page {}", page);

            self.transition(WalkState::Fetching)?;
            let body = self.fetcher.fetch(url.as_deref()).await?;

            self.transition(WalkState::Extracting)?;
            let listing = self
                .extractor
                .extract_listing(&body, self.fetcher.base_url())
                .map_err(|source| ScrapeError::Extract {
                    url: self
                        .fetcher
                        .resolve(url.as_deref())
                        .map(|u| u.to_string())
                        .unwrap_or_else(|_| url.clone().unwrap_or_default()),
                    source,
                })?;

            if listing.stubs.is_empty() && listing.rejected.is_empty() {
                tracing::info!("Page {} has no results, stopping", page);
                self.transition(WalkState::Done)?;
                continue;
            }

            for err in &listing.rejected {
                tracing::warn!("Page {}: skipping result item: {}", page, err);
            }
            self.summary.detail_failures += listing.rejected.len() as u64;

            self.transition(WalkState::Dispatching)?;
            let records = self.dispatch(page, listing.stubs).await?;

            self.transition(WalkState::Persisting)?;
            self.persist(&records);
            self.summary.pages_walked += 1;

            self.transition(WalkState::NextPage)?;
            tracing::info!(
                "Page {} done in {:.2}s: {} records",
                page,
                page_start.elapsed().as_secs_f64(),
                records.len()
            );

            url = Some(listing.next_link);
            page += 1;
            if page > self.max_pages {
                self.transition(WalkState::Done)?;
            }
        }

        tracing::info!(
            "Walk finished in {:.2}s: {} pages, {} inserted, {} duplicates, {} failures",
            start_time.elapsed().as_secs_f64(),
            self.summary.pages_walked,
            self.summary.records_inserted,
            self.summary.duplicates,
            self.summary.failures()
        );

        Ok(self.summary)
    }

    /// Resolves a page's stubs through a fresh worker pool
    ///
    /// Failed stubs are logged and counted; the successful records come back
    /// in listing order.
    async fn dispatch(
        &mut self,
        page: u32,
        stubs: Vec<ResultStub>,
    ) -> Result<Vec<Record>, ScrapeError> {
        let total = stubs.len();
        let pool = WorkerPool::new(self.pool_size);
        let worker = self.worker.clone();

        tracing::debug!(
            "Dispatching {} detail pages ({} at a time)",
            total,
            pool.limit()
        );

        let outcomes = pool
            .run(stubs, move |stub| {
                let worker = worker.clone();
                async move {
                    let identifier = stub.identifier.clone();
                    (identifier, worker.resolve(stub).await)
                }
            })
            .await?;

        let mut records = Vec::with_capacity(total);
        let mut failed = 0;
        for (identifier, outcome) in outcomes {
            match outcome {
                Ok(record) => records.push(record),
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Detail {} failed: {}", identifier, e);
                }
            }
        }

        if failed > 0 {
            tracing::warn!(
                "Page {}: {} of {} detail pages failed",
                page,
                failed,
                total
            );
            self.summary.detail_failures += failed;
        }

        Ok(records)
    }

    /// Writes records one by one; a failed insert never stops the batch
    fn persist(&mut self, records: &[Record]) {
        for record in records {
            match self.sink.insert_if_absent(record) {
                Ok(InsertOutcome::Inserted) => {
                    self.summary.records_inserted += 1;
                }
                Ok(InsertOutcome::AlreadyExists) => {
                    tracing::info!("Record {} already stored, skipping", record.identifier);
                    self.summary.duplicates += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to store record {}: {}", record.identifier, e);
                    self.summary.sink_failures += 1;
                }
            }
        }
    }

    fn transition(&mut self, next: WalkState) -> Result<(), ScrapeError> {
        if !self.state.can_transition_to(next) {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::trace!("{} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }
}
