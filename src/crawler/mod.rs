//! Crawler module for GraphQL querying and crawl orchestration
//!
//! This module contains the core crawling logic, including:
//! - The HTTP query executor and its content-addressed response cache
//! - Cursor pagination
//! - Contribution aggregation
//! - Overall crawl coordination

mod aggregator;
mod cached;
mod coordinator;
mod fetcher;
mod paginator;
pub mod queries;

pub use aggregator::{
    aggregate, merge_contributions, Aggregation, CollaboratorStats, CommitRecord,
};
pub use cached::CachedExecutor;
pub use coordinator::Coordinator;
pub use fetcher::{
    build_http_client, decode_response, ErrorLocation, GraphQlClient, GraphQlError, QueryError,
    QueryExecutor, RawPayload, Variables,
};
pub use paginator::{paginate, paginate_into, Page};

use crate::config::CrawlConfig;
use crate::model::CrawlGraph;
use crate::CrawlError;

/// Runs a complete crawl against the configured GraphQL endpoint
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP client
/// 2. Fetch the target repository's stargazers
/// 3. In full mode, fetch followers, repositories and contributions
/// 4. Return the finished graph for persistence
///
/// # Returns
///
/// * `Ok(CrawlGraph)` - Crawl completed, possibly with skipped units listed in its report
/// * `Err(CrawlError)` - The stargazer list could not be fetched
///
/// # Example
///
/// ```no_run
/// use stargraph::{crawl, CrawlConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = CrawlConfig::new("rust-lang/rust", "ghp_token", "./cache", "basic")?;
/// let graph = crawl(config).await?;
/// println!("{} stargazers", graph.stargazers.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl(config: CrawlConfig) -> Result<CrawlGraph, CrawlError> {
    Coordinator::new(config)?.run().await
}
