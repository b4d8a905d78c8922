use crate::config::types::{Config, OutputConfig, ScraperConfig, SessionConfig, MAX_PAGES_CAP};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_session_config(&config.session)?;
    validate_scraper_config(&config.scraper)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the site session
fn validate_session_config(config: &SessionConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.keyword.trim().is_empty() {
        return Err(ConfigError::Validation(
            "keyword cannot be empty".to_string(),
        ));
    }

    if config.auth_token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "auth-token cannot be empty (copy the loginuser/loginpass cookie from a browser)"
                .to_string(),
        ));
    }

    // Header values cannot carry line breaks
    if config.auth_token.contains(['\r', '\n']) || config.user_agent.contains(['\r', '\n']) {
        return Err(ConfigError::Validation(
            "auth-token and user-agent must be single-line values".to_string(),
        ));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates scrape bounds
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > MAX_PAGES_CAP {
        return Err(ConfigError::Validation(format!(
            "max-pages must be between 1 and {}, got {}",
            MAX_PAGES_CAP, config.max_pages
        )));
    }

    if config.max_concurrent_details < 1 || config.max_concurrent_details > 100 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-details must be between 1 and 100, got {}",
            config.max_concurrent_details
        )));
    }

    if config.page_size < 1 || config.page_size > 100 {
        return Err(ConfigError::Validation(format!(
            "page-size must be between 1 and 100, got {}",
            config.page_size
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
