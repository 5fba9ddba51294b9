//! Record of degraded work during a crawl

use std::fmt;

/// The granularity at which a failure was contained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Follower pagination for one stargazer
    Followers,

    /// One batch of the starred/watched repository query
    UserBatch,

    /// Contribution statistics for one repository
    Statistics,

    /// Collaborator counters for one repository, whose statistics then
    /// come from commit history alone
    Collaborators,

    /// A stargazer the repository batch returned no matching user node for
    UnmatchedUser,

    /// A subscription whose repository record was never seen
    MissingRepo,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Followers => "followers",
            Self::UserBatch => "user_batch",
            Self::Statistics => "statistics",
            Self::Collaborators => "collaborators",
            Self::UnmatchedUser => "unmatched_user",
            Self::MissingRepo => "missing_repo",
        };
        f.write_str(s)
    }
}

/// A unit of work that did not complete
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedUnit {
    pub kind: UnitKind,

    /// Login, batch index, or repository name
    pub subject: String,

    pub reason: String,
}

/// What happened during a run besides the graph itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    pub skipped: Vec<SkippedUnit>,

    /// Follower edges recorded, and how many distinct logins they cover
    pub total_followers: usize,
    pub unique_followers: usize,

    /// Subscriptions that passed the threshold policy
    pub qualifying_subscriptions: usize,

    /// Commits attributed to stargazers across all repositories
    pub commits: u64,
}

impl CrawlReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip(&mut self, kind: UnitKind, subject: impl Into<String>, reason: impl ToString) {
        self.skipped.push(SkippedUnit {
            kind,
            subject: subject.into(),
            reason: reason.to_string(),
        });
    }

    /// Returns true if any unit of work was skipped
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn skipped_of(&self, kind: UnitKind) -> impl Iterator<Item = &SkippedUnit> {
        self.skipped.iter().filter(move |unit| unit.kind == kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report_is_complete() {
        let report = CrawlReport::new();
        assert!(!report.is_partial());
        assert_eq!(report.commits, 0);
    }

    #[test]
    fn test_skip_records_unit() {
        let mut report = CrawlReport::new();
        report.skip(UnitKind::Followers, "octocat", "HTTP 502");
        report.skip(UnitKind::Statistics, "acme/widget", "timeout");

        assert!(report.is_partial());
        let followers: Vec<_> = report.skipped_of(UnitKind::Followers).collect();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].subject, "octocat");
        assert_eq!(followers[0].reason, "HTTP 502");
    }
}
