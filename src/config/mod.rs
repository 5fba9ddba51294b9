//! Configuration module for Stargraph
//!
//! This module handles loading, parsing, and validating the TOML settings
//! file, and resolving it into the immutable [`CrawlConfig`] a run uses.
//!
//! # Example
//!
//! ```no_run
//! use stargraph::config::{load_settings, CrawlConfig};
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("stargraph.toml")).unwrap();
//! let config = CrawlConfig::from_settings(&settings, "token".to_string()).unwrap();
//! println!("Crawling {} in {} mode", config.repository, config.mode);
//! ```

mod crawl_config;
mod parser;
mod policy;
mod settings;
mod validation;

pub use crawl_config::{CrawlConfig, RepoId};
pub use parser::{compute_settings_hash, load_settings, load_settings_with_hash};
pub use policy::{Mode, ThresholdPolicy};
pub use settings::{ApiSettings, CrawlSettings, OutputSettings, Settings};

/// Default GraphQL endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Default user agent sent with every request
pub const DEFAULT_USER_AGENT: &str = concat!("stargraph/", env!("CARGO_PKG_VERSION"));
