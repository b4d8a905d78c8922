//! Bounded worker pool
//!
//! Runs one unit of work per item on the tokio runtime, with at most `limit`
//! units in flight at a time, and joins them all before returning.

use crate::ScrapeError;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Concurrency limit used when the config does not set one
pub const DEFAULT_POOL_SIZE: usize = 20;

/// Worker pool for one batch of items
///
/// The page walker creates a pool per listing page and drops it once the
/// batch has been joined.
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl WorkerPool {
    /// Creates a pool with room for `limit` concurrent units (at least one)
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs `work` over every item and waits for all of them
    ///
    /// Results come back in item order regardless of completion order. The
    /// outcome of each unit, including its own errors, is returned to the
    /// caller; only a panicking unit fails the whole batch.
    pub async fn run<T, R, F, Fut>(&self, items: Vec<T>, work: F) -> Result<Vec<R>, ScrapeError>
    where
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
    {
        let total = items.len();
        let work = Arc::new(work);
        let mut tasks = JoinSet::new();

        for (index, item) in items.into_iter().enumerate() {
            let semaphore = Arc::clone(&self.semaphore);
            let work = Arc::clone(&work);

            tasks.spawn(async move {
                // The semaphore lives as long as the pool and is never closed
                let _permit = semaphore.acquire_owned().await.ok();
                (index, work(item).await)
            });
        }

        let mut results = Vec::with_capacity(total);
        while let Some(joined) = tasks.join_next().await {
            results.push(joined?);
        }

        results.sort_by_key(|(index, _)| *index);
        Ok(results.into_iter().map(|(_, result)| result).collect())
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}
