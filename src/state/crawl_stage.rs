//! Stage definitions for the crawl state machine

use crate::config::Mode;
use std::fmt;

/// The stage a crawl is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlStage {
    /// Paginate the target repository's stargazers (always runs)
    FetchStargazers,

    /// Paginate each stargazer's followers (full mode)
    FetchFollowers,

    /// Batch-query starred and watched repositories (full mode)
    FetchUserRepositories,

    /// Aggregate contributions to qualifying subscribed repos (full mode)
    FetchContributions,

    /// Terminal
    Done,
}

impl CrawlStage {
    /// Returns the stage that follows this one under the given mode
    ///
    /// Basic mode goes straight from stargazer discovery to `Done`.
    pub fn next(&self, mode: Mode) -> Self {
        match (self, mode) {
            (Self::FetchStargazers, Mode::Basic) => Self::Done,
            (Self::FetchStargazers, Mode::Full) => Self::FetchFollowers,
            (Self::FetchFollowers, _) => Self::FetchUserRepositories,
            (Self::FetchUserRepositories, _) => Self::FetchContributions,
            (Self::FetchContributions, _) | (Self::Done, _) => Self::Done,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchStargazers => "fetch_stargazers",
            Self::FetchFollowers => "fetch_followers",
            Self::FetchUserRepositories => "fetch_user_repositories",
            Self::FetchContributions => "fetch_contributions",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for CrawlStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walk(mode: Mode) -> Vec<CrawlStage> {
        let mut stages = vec![CrawlStage::FetchStargazers];
        let mut stage = CrawlStage::FetchStargazers;
        while !stage.is_terminal() {
            stage = stage.next(mode);
            stages.push(stage);
        }
        stages
    }

    #[test]
    fn test_basic_mode_stops_after_stargazers() {
        assert_eq!(
            walk(Mode::Basic),
            vec![CrawlStage::FetchStargazers, CrawlStage::Done]
        );
    }

    #[test]
    fn test_full_mode_runs_every_stage() {
        assert_eq!(
            walk(Mode::Full),
            vec![
                CrawlStage::FetchStargazers,
                CrawlStage::FetchFollowers,
                CrawlStage::FetchUserRepositories,
                CrawlStage::FetchContributions,
                CrawlStage::Done,
            ]
        );
    }

    #[test]
    fn test_done_is_absorbing() {
        assert_eq!(CrawlStage::Done.next(Mode::Full), CrawlStage::Done);
        assert_eq!(CrawlStage::Done.next(Mode::Basic), CrawlStage::Done);
    }
}
