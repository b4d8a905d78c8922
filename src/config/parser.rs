use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Values supplied outside the config file (command line, environment)
///
/// Any field that is `Some` replaces the corresponding config value before
/// validation runs.
#[derive(Debug, Clone, Default)]
pub struct SessionOverrides {
    pub keyword: Option<String>,
    pub auth_token: Option<String>,
}

impl SessionOverrides {
    fn apply(&self, config: &mut Config) {
        if let Some(keyword) = &self.keyword {
            config.session.keyword = keyword.clone();
        }
        if let Some(token) = &self.auth_token {
            config.session.auth_token = token.clone();
        }
    }
}

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use lawstar_scraper::config::load_config;
///
/// let config = load_config(Path::new("lawstar.toml")).unwrap();
/// println!("Keyword: {}", config.session.keyword);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    load_config_with_overrides(path, &SessionOverrides::default())
}

/// Loads a configuration file, applies overrides, then validates
pub fn load_config_with_overrides(
    path: &Path,
    overrides: &SessionOverrides,
) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    overrides.apply(&mut config);
    validate(&config)?;

    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Stored with each run so that runs can be told apart by the config they
/// were started with.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(
    path: &Path,
    overrides: &SessionOverrides,
) -> Result<(Config, String), ConfigError> {
    let config = load_config_with_overrides(path, overrides)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
