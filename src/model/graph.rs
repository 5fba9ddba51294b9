use crate::config::{Mode, RepoId};
use crate::model::{Repo, Stargazer};
use crate::state::CrawlReport;
use std::collections::BTreeMap;

/// The result of a completed crawl, handed to the persistence layer
#[derive(Debug, Clone)]
pub struct CrawlGraph {
    pub repository: RepoId,
    pub mode: Mode,

    /// Stargazers in the order the API returned them
    pub stargazers: Vec<Stargazer>,

    /// Every repository seen, deduplicated by full name
    pub repos: BTreeMap<String, Repo>,

    /// Units of work that were skipped, and run counters
    pub report: CrawlReport,
}

impl CrawlGraph {
    /// Total number of follower edges recorded
    pub fn follower_count(&self) -> usize {
        self.stargazers.iter().map(|s| s.followers.len()).sum()
    }

    /// Number of repositories whose statistics were queried
    pub fn repos_with_statistics(&self) -> usize {
        self.repos.values().filter(|r| r.statistics.is_some()).count()
    }

    /// Total number of (stargazer, repository) contribution records
    pub fn contribution_count(&self) -> usize {
        self.stargazers.iter().map(|s| s.contributions.len()).sum()
    }
}
