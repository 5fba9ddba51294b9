//! Content-addressed response cache
//!
//! Every GraphQL response is stored under a fingerprint of the query text
//! and its variables. Entries never expire: replaying a run re-issues the
//! same logical queries and finds every previously received payload here.

mod fingerprint;
mod store;

pub use fingerprint::{canonical_json, fingerprint};
pub use store::{CacheEntry, CacheStore};

use thiserror::Error;

/// Errors that can occur while reading or writing the cache
///
/// These never escape the cached executor: reads degrade to a miss and
/// writes are logged and dropped.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;
