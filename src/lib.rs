//! Stargraph: a cache-backed stargazer graph crawler
//!
//! This crate crawls the social graph around a GitHub repository: its
//! stargazers, their followers, the repositories they star and watch, and
//! their contributions to those repositories. Every GraphQL response is kept
//! in a content-addressed cache so interrupted runs can be restarted cheaply.

pub mod cache;
pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Stargraph operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Query failed: {0}")]
    Query(#[from] crawler::QueryError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Failed to fetch stargazers of {repository}: {source}")]
    Stargazers {
        repository: String,
        source: crawler::QueryError,
    },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid mode: {0}. Use 'basic' or 'full'")]
    InvalidMode(String),

    #[error("Invalid repository format: {0}. Use 'owner/name'")]
    InvalidRepository(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Stargraph operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{CrawlConfig, Mode, RepoId, ThresholdPolicy};
pub use crawler::{crawl, Coordinator};
pub use model::{Contribution, CrawlGraph, Repo, Stargazer, User};
