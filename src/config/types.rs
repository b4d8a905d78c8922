use crate::crawler::DEFAULT_POOL_SIZE;
use serde::Deserialize;
use url::Url;

/// Browser user agent sent when the config does not name one
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.116 Safari/537.36";

/// Site the scraper targets unless the config says otherwise
pub const DEFAULT_BASE_URL: &str = "http://law1.law-star.com";

/// Hard cap on listing pages walked in one run
pub const MAX_PAGES_CAP: u32 = 10;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub session: SessionConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    pub output: OutputConfig,
}

/// Site session: where to search, for what, and as whom
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Base URL that relative links are resolved against
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Search keyword
    #[serde(default)]
    pub keyword: String,

    /// Cookie string copied from a logged-in browser session
    /// (only the `loginuser` and `loginpass` pairs are needed)
    #[serde(rename = "auth-token", default)]
    pub auth_token: String,

    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl SessionConfig {
    /// Builds the URL of the first search-result page
    ///
    /// The query restricts results to the central and local legislation
    /// databases and sorts them by importance.
    pub fn search_url(&self, page_size: u32) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&self.base_url)?.join("/search")?;
        url.query_pairs_mut()
            .append_pair("kw", &self.keyword)
            .append_pair("dbt", "chl")
            .append_pair("dbt", "lar")
            .append_pair("ps", &page_size.to_string())
            .append_pair("sort", "imp")
            .append_pair("p", "1");
        Ok(url)
    }
}

/// Scrape behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Number of listing pages to walk
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Maximum number of detail pages fetched at once
    #[serde(
        rename = "max-concurrent-details",
        default = "default_max_concurrent_details"
    )]
    pub max_concurrent_details: u32,

    /// Results per listing page (`ps` query parameter)
    #[serde(rename = "page-size", default = "default_page_size")]
    pub page_size: u32,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_pages: default_max_pages(),
            max_concurrent_details: default_max_concurrent_details(),
            page_size: default_page_size(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_max_pages() -> u32 {
    MAX_PAGES_CAP
}

fn default_max_concurrent_details() -> u32 {
    DEFAULT_POOL_SIZE as u32
}

fn default_page_size() -> u32 {
    50
}
