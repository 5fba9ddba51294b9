use std::collections::BTreeMap;

/// A repository reached through a stargazer's stars or subscriptions
///
/// Exactly one `Repo` exists per full name for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repo {
    /// "owner/name"
    pub full_name: String,
    pub stargazers_count: u64,
    pub forks_count: u64,
    pub open_issues: u64,

    /// Contributions by known stargazers, keyed by login
    ///
    /// `None` until statistics have been queried for this repository.
    pub statistics: Option<BTreeMap<String, Contribution>>,
}

impl Repo {
    pub fn new(full_name: &str, stargazers_count: u64, forks_count: u64, open_issues: u64) -> Self {
        Self {
            full_name: full_name.to_string(),
            stargazers_count,
            forks_count,
            open_issues,
            statistics: None,
        }
    }
}

/// Contribution counters for one (repository, login) pair
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contribution {
    pub login: String,
    pub commits: u64,
    pub additions: u64,
    pub deletions: u64,
}

impl Contribution {
    pub fn new(login: &str) -> Self {
        Self {
            login: login.to_string(),
            ..Self::default()
        }
    }
}
