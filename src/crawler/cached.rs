//! Cache-backed query execution
//!
//! Wraps a [`QueryExecutor`] with a [`CacheStore`]. A fingerprint hit is
//! answered from disk without touching the network; a miss is executed and
//! then persisted. The cache is fail-open in both directions: unreadable
//! entries count as misses and failed writes are only logged.

use crate::cache::{fingerprint, CacheStore};
use crate::crawler::{QueryError, QueryExecutor, RawPayload, Variables};
use serde::de::DeserializeOwned;
use std::sync::atomic::{AtomicU64, Ordering};

/// Query executor with a content-addressed response cache in front of it
#[derive(Debug)]
pub struct CachedExecutor<E> {
    inner: E,
    store: CacheStore,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<E: QueryExecutor> CachedExecutor<E> {
    pub fn new(inner: E, store: CacheStore) -> Self {
        Self {
            inner,
            store,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Returns the payload for `(query, variables)`, from cache if possible
    ///
    /// Executor failures are returned unchanged and never cached.
    pub async fn fetch(&self, query: &str, variables: &Variables) -> Result<RawPayload, QueryError> {
        let key = fingerprint(query, variables);

        match self.store.get(&key) {
            Ok(Some(payload)) => {
                tracing::debug!("Cache hit for {}", key);
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(payload);
            }
            Ok(None) => {
                tracing::debug!("Cache miss for {}", key);
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable cache entry {}: {}", key, e);
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let payload = self.inner.execute(query, variables).await?;

        if let Err(e) = self.store.put(&key, query, &payload) {
            tracing::warn!("Failed to cache response {}: {}", key, e);
        }

        Ok(payload)
    }

    /// Fetches and decodes the payload into `T`
    pub async fn fetch_as<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: &Variables,
    ) -> Result<T, QueryError> {
        let payload = self.fetch(query, variables).await?;
        Ok(payload.decode()?)
    }

    /// Number of calls answered from the cache
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of calls passed through to the executor
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepoId;
    use std::fs;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    /// Executor that answers every query with a fixed payload and counts calls
    struct CountingExecutor {
        response: Result<&'static str, u16>,
        calls: AtomicUsize,
    }

    impl CountingExecutor {
        fn ok(json: &'static str) -> Self {
            Self {
                response: Ok(json),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                response: Err(status),
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl QueryExecutor for CountingExecutor {
        async fn execute(&self, _query: &str, _variables: &Variables) -> Result<RawPayload, QueryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.response {
                Ok(json) => Ok(RawPayload::from_json(json)?),
                Err(status) => Err(QueryError::Status {
                    status,
                    body: "upstream failure".to_string(),
                }),
            }
        }
    }

    fn store(dir: &TempDir) -> CacheStore {
        let repo: RepoId = "acme/widget".parse().unwrap();
        CacheStore::new(dir.path(), &repo)
    }

    #[tokio::test]
    async fn test_second_identical_fetch_hits_cache() {
        let dir = TempDir::new().unwrap();
        let executor = CachedExecutor::new(CountingExecutor::ok(r#"{"n": 1}"#), store(&dir));
        let vars = Variables::new().with("login", "octocat");

        let first = executor.fetch("query Q", &vars).await.unwrap();
        let second = executor.fetch("query Q", &vars).await.unwrap();

        assert_eq!(executor.inner().calls(), 1);
        assert_eq!(first.as_bytes(), second.as_bytes());
        assert_eq!(executor.hits(), 1);
        assert_eq!(executor.misses(), 1);
    }

    #[tokio::test]
    async fn test_reordered_variables_hit_cache() {
        let dir = TempDir::new().unwrap();
        let executor = CachedExecutor::new(CountingExecutor::ok(r#"{"n": 1}"#), store(&dir));

        executor
            .fetch("query Q", &Variables::new().with("a", 1).with("b", 2))
            .await
            .unwrap();
        executor
            .fetch("query Q", &Variables::new().with("b", 2).with("a", 1))
            .await
            .unwrap();

        assert_eq!(executor.inner().calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_are_not_cached() {
        let dir = TempDir::new().unwrap();
        let executor = CachedExecutor::new(CountingExecutor::failing(502), store(&dir));
        let vars = Variables::new();

        assert!(matches!(
            executor.fetch("query Q", &vars).await,
            Err(QueryError::Status { status: 502, .. })
        ));
        assert!(executor.fetch("query Q", &vars).await.is_err());

        assert_eq!(executor.inner().calls(), 2);
        assert!(!executor.store().contains(&fingerprint("query Q", &vars)));
    }

    #[tokio::test]
    async fn test_corrupt_entry_is_treated_as_miss_and_rewritten() {
        let dir = TempDir::new().unwrap();
        let executor = CachedExecutor::new(CountingExecutor::ok(r#"{"n": 2}"#), store(&dir));
        let vars = Variables::new();
        let key = fingerprint("query Q", &vars);

        fs::create_dir_all(executor.store().dir()).unwrap();
        fs::write(executor.store().path_for(&key), b"garbage").unwrap();

        let payload = executor.fetch("query Q", &vars).await.unwrap();
        assert_eq!(payload.as_str(), r#"{"n": 2}"#);
        assert_eq!(executor.inner().calls(), 1);

        executor.fetch("query Q", &vars).await.unwrap();
        assert_eq!(executor.inner().calls(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_does_not_fail_fetch() {
        let dir = TempDir::new().unwrap();
        // A regular file where the cache directory tree should go
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, b"").unwrap();
        let repo: RepoId = "acme/widget".parse().unwrap();
        let executor = CachedExecutor::new(
            CountingExecutor::ok(r#"{"n": 3}"#),
            CacheStore::new(&blocker, &repo),
        );

        let payload = executor.fetch("query Q", &Variables::new()).await.unwrap();
        assert_eq!(payload.as_str(), r#"{"n": 3}"#);
    }

    #[tokio::test]
    async fn test_fetch_as_decodes() {
        #[derive(serde::Deserialize)]
        struct Data {
            n: u32,
        }

        let dir = TempDir::new().unwrap();
        let executor = CachedExecutor::new(CountingExecutor::ok(r#"{"n": 7}"#), store(&dir));

        let data: Data = executor.fetch_as("query Q", &Variables::new()).await.unwrap();
        assert_eq!(data.n, 7);
    }
}
