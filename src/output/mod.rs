//! Output module for crawl summaries and statistics
//!
//! This module handles:
//! - Summarizing a finished crawl graph
//! - Loading and printing statistics from the crawl database

pub mod stats;
mod summary;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};
pub use summary::{print_summary, CrawlSummary};
