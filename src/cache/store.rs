//! File-backed cache store
//!
//! Layout: `<cache-root>/<owner>/<name>/graphql/<fingerprint>.json`, one
//! file per fingerprint, containing `{"response": <payload>, "query": <text>}`.

use crate::cache::CacheResult;
use crate::config::RepoId;
use crate::crawler::RawPayload;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// A cached response as stored on disk
#[derive(Debug, Deserialize)]
pub struct CacheEntry {
    pub response: Box<RawValue>,

    /// The query that produced the response, kept for diagnostics
    pub query: String,
}

#[derive(Serialize)]
struct CacheEntryRef<'a> {
    response: &'a RawValue,
    query: &'a str,
}

/// Append-only store of responses keyed by fingerprint
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Creates a store scoped to one repository under the cache root
    ///
    /// Nothing is created on disk until the first write.
    pub fn new(cache_root: &Path, repository: &RepoId) -> Self {
        Self {
            dir: cache_root
                .join(&repository.owner)
                .join(&repository.name)
                .join("graphql"),
        }
    }

    /// Directory holding this store's entries
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for a fingerprint
    pub fn path_for(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{}.json", fingerprint))
    }

    /// Looks up a fingerprint
    ///
    /// # Returns
    ///
    /// * `Ok(Some(payload))` - Entry exists and parsed
    /// * `Ok(None)` - No entry for this fingerprint
    /// * `Err(CacheError)` - Entry exists but could not be read or parsed
    pub fn get(&self, fingerprint: &str) -> CacheResult<Option<RawPayload>> {
        let bytes = match fs::read(self.path_for(fingerprint)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes)?;
        Ok(Some(RawPayload::from_raw(entry.response)))
    }

    /// Stores a payload under a fingerprint
    ///
    /// The entry is written to a temporary file and renamed into place so an
    /// interrupted write never leaves a truncated entry behind.
    pub fn put(&self, fingerprint: &str, query: &str, payload: &RawPayload) -> CacheResult<()> {
        fs::create_dir_all(&self.dir)?;

        let entry = CacheEntryRef {
            response: payload.as_raw(),
            query,
        };
        let data = serde_json::to_vec(&entry)?;

        let path = self.path_for(fingerprint);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, &path)?;

        Ok(())
    }

    /// Returns true if an entry exists for the fingerprint
    pub fn contains(&self, fingerprint: &str) -> bool {
        self.path_for(fingerprint).is_file()
    }
}
