//! Storage traits and error types
//!
//! This module defines the trait interface for graph persistence backends
//! and associated error types.

use crate::model::CrawlGraph;
use crate::storage::RunRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for graph persistence backends
///
/// A backend receives the finished graph of one crawl. Saving a graph for a
/// repository replaces whatever an earlier run stored for that repository.
pub trait GraphStore {
    // ===== Run Management =====

    /// Records the start of a crawl run
    ///
    /// # Arguments
    ///
    /// * `repository` - Target repository, "owner/name"
    /// * `mode` - Crawl mode the run uses
    /// * `settings_hash` - Hash of the settings file the run was started with
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, repository: &str, mode: &str, settings_hash: &str)
        -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Marks a run as failed with a finish timestamp
    fn fail_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Graph Persistence =====

    /// Stores a finished graph and completes the run
    ///
    /// Everything is written in one transaction. The run ends as `completed`,
    /// or `partial` when the graph's report lists skipped units.
    fn save_graph(&mut self, run_id: i64, graph: &CrawlGraph) -> StorageResult<()>;

    /// Gets the skipped units recorded for a run as (kind, subject, reason)
    fn get_skipped_units(&self, run_id: i64) -> StorageResult<Vec<(String, String, String)>>;

    // ===== Statistics =====

    /// Counts stored stargazers across all repositories
    fn count_stargazers(&self) -> StorageResult<u64>;

    /// Counts follower edges
    fn count_follower_edges(&self) -> StorageResult<u64>;

    /// Counts distinct follower logins
    fn count_unique_followers(&self) -> StorageResult<u64>;

    /// Counts distinct repositories reached through stars or subscriptions
    fn count_repos(&self) -> StorageResult<u64>;

    /// Counts repositories whose contribution statistics were queried
    fn count_repos_with_statistics(&self) -> StorageResult<u64>;

    /// Counts (stargazer, repository) contribution records
    fn count_contributions(&self) -> StorageResult<u64>;

    /// Gets the repositories most often subscribed to by stargazers
    ///
    /// Returns (full name, subscriber count), most subscribed first.
    fn get_top_subscribed(&self, limit: usize) -> StorageResult<Vec<(String, u64)>>;
}
