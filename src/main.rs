//! Lawstar-Scraper main entry point
//!
//! This is the command-line interface for the law-star search scraper.

use anyhow::Context;
use clap::Parser;
use lawstar_scraper::config::{load_config_with_hash, Config, SessionOverrides};
use lawstar_scraper::crawler::scrape;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Lawstar-Scraper: harvest law-star search results into SQLite
///
/// Walks up to ten pages of results for one keyword search, fetches every
/// result's detail page, and stores each document once. The session cookie
/// must be copied from a logged-in browser beforehand.
#[derive(Parser, Debug)]
#[command(name = "lawstar-scraper")]
#[command(version = "1.0.0")]
#[command(about = "Harvest law-star search results", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Search keyword (overrides the config file)
    #[arg(short, long)]
    keyword: Option<String>,

    /// Session cookie, e.g. "loginuser=...; loginpass=..." (overrides the config file)
    #[arg(long, env = "LAWSTAR_AUTH_TOKEN", hide_env_values = true)]
    auth_token: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the search URL without fetching anything
    #[arg(long, conflicts_with_all = ["stats", "export"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "export"])]
    stats: bool,

    /// Export stored records as JSON Lines to this file and exit
    #[arg(long, value_name = "FILE", conflicts_with_all = ["dry_run", "stats"])]
    export: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let overrides = SessionOverrides {
        keyword: cli.keyword.clone(),
        auth_token: cli.auth_token.clone(),
    };
    let (config, config_hash) = load_config_with_hash(&cli.config, &overrides)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(path) = &cli.export {
        handle_export(&config, path)?;
    } else {
        handle_scrape(&config, &config_hash).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("lawstar_scraper=info,warn"),
            1 => EnvFilter::new("lawstar_scraper=debug,info"),
            2 => EnvFilter::new("lawstar_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates config and shows what would be fetched
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    println!("=== Lawstar-Scraper Dry Run ===\n");

    println!("Session:");
    println!("  Base URL: {}", config.session.base_url);
    println!("  Keyword: {}", config.session.keyword);
    println!("  User agent: {}", config.session.user_agent);
    println!(
        "  Auth token: {} characters",
        config.session.auth_token.chars().count()
    );

    println!("\nScraper:");
    println!("  Max pages: {}", config.scraper.max_pages);
    println!(
        "  Max concurrent details: {}",
        config.scraper.max_concurrent_details
    );
    println!("  Page size: {}", config.scraper.page_size);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let search_url = config
        .session
        .search_url(config.scraper.page_size)
        .context("Failed to build search URL")?;

    println!("\n✓ Configuration is valid");
    println!("✓ Would start from {}", search_url);

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use lawstar_scraper::output::{load_statistics, print_statistics};
    use lawstar_scraper::storage::open_storage;

    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --export mode: writes all records as JSON Lines
fn handle_export(config: &Config, path: &Path) -> anyhow::Result<()> {
    use lawstar_scraper::output::export_records;
    use lawstar_scraper::storage::open_storage;

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let count = export_records(&storage, path)
        .with_context(|| format!("Failed to export records to {}", path.display()))?;

    println!("✓ Exported {} records to: {}", count, path.display());

    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(config: &Config, config_hash: &str) -> anyhow::Result<()> {
    tracing::info!(
        "Scraping '{}' from {} (up to {} pages, {} concurrent details)",
        config.session.keyword,
        config.session.base_url,
        config.scraper.max_pages,
        config.scraper.max_concurrent_details
    );

    match scrape(config, config_hash).await {
        Ok(summary) => {
            tracing::info!(
                "Scrape completed: {} pages, {} new records, {} duplicates, {} failures",
                summary.pages_walked,
                summary.records_inserted,
                summary.duplicates,
                summary.failures()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}
