//! Configuration module
//!
//! This module handles loading, parsing, and validating the TOML configuration
//! file, and merging in session values given on the command line.
//!
//! # Example
//!
//! ```no_run
//! use lawstar_scraper::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("lawstar.toml")).unwrap();
//! println!("Walking up to {} pages", config.scraper.max_pages);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, OutputConfig, ScraperConfig, SessionConfig, DEFAULT_BASE_URL, DEFAULT_USER_AGENT,
    MAX_PAGES_CAP,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_config_with_overrides,
    SessionOverrides,
};
