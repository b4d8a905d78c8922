//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the scraper:
//! - Building the HTTP client with the session's user agent
//! - Resolving relative links against the site base URL
//! - Attaching the session cookie to every request
//! - Turning any non-200 response into a `ScrapeError::Fetch`
//!
//! No retry or timeout is applied, and redirects follow the client default.

use crate::config::{ScraperConfig, SessionConfig};
use crate::ScrapeError;
use reqwest::header::COOKIE;
use reqwest::{Client, StatusCode};
use url::Url;

/// Builds an HTTP client that identifies itself with the session user agent
///
/// # Example
///
/// ```no_run
/// use lawstar_scraper::config::{SessionConfig, DEFAULT_USER_AGENT};
/// use lawstar_scraper::crawler::build_http_client;
///
/// let session = SessionConfig {
///     base_url: "http://law1.law-star.com".to_string(),
///     keyword: "劳动法".to_string(),
///     auth_token: "loginuser=...; loginpass=...".to_string(),
///     user_agent: DEFAULT_USER_AGENT.to_string(),
/// };
///
/// let client = build_http_client(&session).unwrap();
/// ```
pub fn build_http_client(session: &SessionConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(session.user_agent.clone())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Authenticated GET requests against the configured site
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    base_url: Url,
    search_url: Url,
    auth_token: String,
}

impl Fetcher {
    /// Creates a fetcher for the given session
    pub fn new(session: &SessionConfig, scraper: &ScraperConfig) -> Result<Self, ScrapeError> {
        let client = build_http_client(session)?;
        Ok(Self {
            client,
            base_url: Url::parse(&session.base_url)?,
            search_url: session.search_url(scraper.page_size)?,
            auth_token: session.auth_token.clone(),
        })
    }

    /// Base URL that relative links are resolved against
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL of the first search-result page
    pub fn search_url(&self) -> &Url {
        &self.search_url
    }

    /// Maps an optional, possibly relative link to the URL to request
    ///
    /// `None` means the first search-result page.
    pub fn resolve(&self, url: Option<&str>) -> Result<Url, ScrapeError> {
        match url {
            None => Ok(self.search_url.clone()),
            Some(link) => Ok(self.base_url.join(link.trim())?),
        }
    }

    /// Fetches a page and returns its raw body
    ///
    /// # Arguments
    ///
    /// * `url` - Link to fetch, or `None` for the first search-result page
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<u8>)` - Body of an HTTP 200 response
    /// * `Err(ScrapeError::Fetch)` - The server answered with any other status
    /// * `Err(ScrapeError::Http)` - The request itself failed
    pub async fn fetch(&self, url: Option<&str>) -> Result<Vec<u8>, ScrapeError> {
        let target = self.resolve(url)?;
        tracing::info!("Fetching {}", target);

        let response = self
            .client
            .get(target.clone())
            .header(COOKIE, self.auth_token.as_str())
            .send()
            .await
            .map_err(|source| ScrapeError::Http {
                url: target.to_string(),
                source,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("{} answered HTTP {}", target, status.as_u16());
            return Err(ScrapeError::Fetch {
                url: target.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| ScrapeError::Http {
                url: target.to_string(),
                source,
            })?;

        Ok(body.to_vec())
    }
}
