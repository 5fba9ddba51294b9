//! Stargraph main entry point
//!
//! This is the command-line interface for the Stargraph stargazer crawler.

use clap::Parser;
use stargraph::config::{load_settings_with_hash, CrawlConfig, Settings};
use stargraph::crawler::crawl;
use stargraph::output::{load_statistics, print_statistics, print_summary, CrawlSummary};
use stargraph::storage::{open_storage, GraphStore};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Stargraph: a cache-backed stargazer graph crawler
///
/// Stargraph crawls the stargazers of a GitHub repository and, in full mode,
/// their followers, starred and watched repositories, and contributions.
/// Every API response is cached on disk, so an interrupted crawl can simply
/// be started again.
#[derive(Parser, Debug)]
#[command(name = "stargraph")]
#[command(version)]
#[command(about = "A cache-backed stargazer graph crawler", long_about = None)]
struct Cli {
    /// Path to TOML settings file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Repository to crawl, overriding the settings file ("owner/name")
    #[arg(long, value_name = "OWNER/NAME")]
    repo: Option<String>,

    /// Crawl mode, overriding the settings file ("basic" or "full")
    #[arg(long)]
    mode: Option<String>,

    /// GitHub access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Validate settings and show what would be crawled without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate settings
    tracing::info!("Loading settings from: {}", cli.config.display());
    let (mut settings, settings_hash) = match load_settings_with_hash(&cli.config) {
        Ok((settings, hash)) => {
            tracing::info!("Settings loaded successfully (hash: {})", hash);
            (settings, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load settings: {}", e);
            return Err(e.into());
        }
    };

    if let Some(repo) = &cli.repo {
        settings.crawl.repository = repo.clone();
    }
    if let Some(mode) = &cli.mode {
        settings.crawl.mode = mode.clone();
    }

    if cli.stats {
        handle_stats(&settings)?;
        return Ok(());
    }

    if cli.dry_run {
        let config = CrawlConfig::from_settings(&settings, cli.token.unwrap_or_default())?;
        handle_dry_run(&config, &settings);
        return Ok(());
    }

    let token = match cli.token.filter(|t| !t.is_empty()) {
        Some(token) => token,
        None => {
            tracing::error!("No access token given; use --token or set GITHUB_TOKEN");
            return Err("missing GitHub access token".into());
        }
    };

    let config = CrawlConfig::from_settings(&settings, token)?;
    handle_crawl(config, &settings, &settings_hash).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("stargraph=info,warn"),
            1 => EnvFilter::new("stargraph=debug,info"),
            2 => EnvFilter::new("stargraph=trace,debug"),
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

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &CrawlConfig, settings: &Settings) {
    println!("=== Stargraph Dry Run ===\n");

    println!("Crawl:");
    println!("  Repository: {}", config.repository);
    println!("  Mode: {}", config.mode);
    println!("  Cache directory: {}", config.cache_dir.display());

    println!("\nThreshold Policy:");
    println!("  Max starred per user: {}", config.policy.max_starred);
    println!("  Max subscribed per user: {}", config.policy.max_subscribed);
    println!("  Min stargazers: {}", config.policy.min_stargazers);
    println!("  Min forks: {}", config.policy.min_forks);
    println!("  Min open issues: {}", config.policy.min_open_issues);

    println!("\nAPI:");
    println!("  Endpoint: {}", config.endpoint);
    println!("  Timeout: {}s", config.timeout.as_secs());
    println!("  User agent: {}", config.user_agent);
    println!(
        "  Token: {}",
        if config.token.is_empty() { "not set" } else { "set" }
    );

    println!("\nOutput:");
    println!("  Database: {}", settings.output.database_path);

    println!("\n✓ Settings are valid");
    if config.mode.is_full() {
        println!("✓ Would crawl stargazers, followers, repositories and contributions");
    } else {
        println!("✓ Would crawl stargazers only");
    }
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}\n", settings.output.database_path);

    let storage = open_storage(Path::new(&settings.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
///
/// A failed crawl marks its run as failed and returns the error; it is never
/// reported as an empty success.
async fn handle_crawl(
    config: CrawlConfig,
    settings: &Settings,
    settings_hash: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut storage = open_storage(Path::new(&settings.output.database_path))?;
    let repository = config.repository.full_name();
    let run_id = storage.create_run(&repository, config.mode.as_str(), settings_hash)?;

    tracing::info!(
        "Run {}: crawling {} in {} mode (cache: {})",
        run_id,
        repository,
        config.mode,
        config.cache_dir.display()
    );

    let graph = match crawl(config).await {
        Ok(graph) => graph,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            if let Err(store_err) = storage.fail_run(run_id) {
                tracing::error!("Failed to mark run {} as failed: {}", run_id, store_err);
            }
            return Err(e.into());
        }
    };

    storage.save_graph(run_id, &graph)?;
    tracing::info!(
        "Saved crawl of {} to {}",
        repository,
        settings.output.database_path
    );

    print_summary(&CrawlSummary::from_graph(&graph));

    Ok(())
}
