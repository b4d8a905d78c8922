//! Detail worker: one result stub in, one complete record out

use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::record::{Record, ResultStub};
use crate::ScrapeError;
use std::sync::Arc;

/// Fetches a stub's detail page and merges the extracted fields into a record
///
/// Cheap to clone; every clone shares the HTTP client and compiled selectors.
#[derive(Debug, Clone)]
pub struct DetailWorker {
    fetcher: Fetcher,
    extractor: Arc<Extractor>,
}

impl DetailWorker {
    pub fn new(fetcher: Fetcher, extractor: Arc<Extractor>) -> Self {
        Self { fetcher, extractor }
    }

    /// Resolves one stub into a record
    ///
    /// The record keeps the stub's identifier, URL and title unchanged. Fetch
    /// errors are returned as-is; missing content fields are not errors.
    pub async fn resolve(&self, stub: ResultStub) -> Result<Record, ScrapeError> {
        let page = self.fetcher.fetch(Some(&stub.url)).await?;
        let fields = self.extractor.extract_detail(&page);

        tracing::debug!(
            "Resolved {} ({} of 6 fields present)",
            stub.identifier,
            fields.present_count()
        );

        Ok(Record::from_parts(stub, fields))
    }
}
