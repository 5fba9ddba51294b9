//! Statistics generation from the crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer.

use crate::storage::{GraphStore, RunRecord};
use crate::CrawlError;

/// How many repositories to list in the most-subscribed table
const TOP_SUBSCRIBED_LIMIT: usize = 10;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Total number of stargazers stored
    pub stargazers: u64,

    /// Follower edges, and the distinct users they point at
    pub follower_edges: u64,
    pub unique_followers: u64,

    /// Repositories reached through stars or subscriptions
    pub repos: u64,

    /// Repositories whose contribution statistics were queried
    pub repos_with_statistics: u64,

    /// (stargazer, repository) contribution records
    pub contributions: u64,

    /// Most subscribed repositories with their subscriber counts
    pub top_subscribed: Vec<(String, u64)>,

    /// The most recent run, if any
    pub last_run: Option<RunRecord>,

    /// Units the most recent run skipped, as (kind, subject, reason)
    pub skipped_units: Vec<(String, String, String)>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(CrawlStatistics)` - Successfully loaded statistics
/// * `Err(CrawlError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn GraphStore) -> Result<CrawlStatistics, CrawlError> {
    let last_run = storage.get_latest_run()?;
    let skipped_units = match &last_run {
        Some(run) => storage.get_skipped_units(run.id)?,
        None => Vec::new(),
    };

    Ok(CrawlStatistics {
        stargazers: storage.count_stargazers()?,
        follower_edges: storage.count_follower_edges()?,
        unique_followers: storage.count_unique_followers()?,
        repos: storage.count_repos()?,
        repos_with_statistics: storage.count_repos_with_statistics()?,
        contributions: storage.count_contributions()?,
        top_subscribed: storage.get_top_subscribed(TOP_SUBSCRIBED_LIMIT)?,
        last_run,
        skipped_units,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    match &stats.last_run {
        Some(run) => {
            println!("Last Run:");
            println!("  ID: {}", run.id);
            println!("  Repository: {} ({} mode)", run.repository, run.mode);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            println!("  Settings hash: {}", run.settings_hash);
            println!();
        }
        None => {
            println!("No crawl runs recorded yet.\n");
        }
    }

    println!("Overview:");
    println!("  Stargazers: {}", stats.stargazers);
    println!(
        "  Follower edges: {} ({} unique users)",
        stats.follower_edges, stats.unique_followers
    );
    println!("  Repositories: {}", stats.repos);
    println!(
        "  Repositories with statistics: {}",
        stats.repos_with_statistics
    );
    println!("  Contribution records: {}", stats.contributions);
    println!();

    if !stats.top_subscribed.is_empty() {
        println!("Most Subscribed Repositories:");
        for (full_name, subscribers) in &stats.top_subscribed {
            println!("  {:>5}  {}", subscribers, full_name);
        }
        println!();
    }

    if !stats.skipped_units.is_empty() {
        println!("Skipped Units ({}):", stats.skipped_units.len());
        for (kind, subject, reason) in &stats.skipped_units {
            println!("  - [{}] {}: {}", kind, subject, reason);
        }
        println!();
    }
}
