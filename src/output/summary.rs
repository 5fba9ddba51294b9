//! End-of-run summary of a finished crawl

use crate::model::CrawlGraph;
use crate::state::UnitKind;

/// Headline numbers for one finished crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub repository: String,
    pub mode: String,
    pub stargazers: usize,
    pub follower_edges: usize,
    pub unique_followers: usize,
    pub repos: usize,
    pub repos_with_statistics: usize,
    pub qualifying_subscriptions: usize,
    pub contributions: usize,
    pub commits: u64,

    /// Skipped units per kind, only kinds that occurred
    pub skipped: Vec<(UnitKind, usize)>,
}

impl CrawlSummary {
    pub fn from_graph(graph: &CrawlGraph) -> Self {
        let report = &graph.report;
        let skipped = [
            UnitKind::Followers,
            UnitKind::UserBatch,
            UnitKind::Statistics,
            UnitKind::Collaborators,
            UnitKind::UnmatchedUser,
            UnitKind::MissingRepo,
        ]
        .into_iter()
        .map(|kind| (kind, report.skipped_of(kind).count()))
        .filter(|(_, count)| *count > 0)
        .collect();

        Self {
            repository: graph.repository.full_name(),
            mode: graph.mode.to_string(),
            stargazers: graph.stargazers.len(),
            follower_edges: graph.follower_count(),
            unique_followers: report.unique_followers,
            repos: graph.repos.len(),
            repos_with_statistics: graph.repos_with_statistics(),
            qualifying_subscriptions: report.qualifying_subscriptions,
            contributions: graph.contribution_count(),
            commits: report.commits,
            skipped,
        }
    }

    /// Returns true if any unit of work was skipped
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }
}

/// Prints a crawl summary to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary: {} ({}) ===\n", summary.repository, summary.mode);

    println!("  Stargazers: {}", summary.stargazers);
    if summary.mode == "full" {
        println!(
            "  Follower edges: {} ({} unique users)",
            summary.follower_edges, summary.unique_followers
        );
        println!("  Repositories: {}", summary.repos);
        println!(
            "  Qualifying subscriptions: {}",
            summary.qualifying_subscriptions
        );
        println!(
            "  Repositories with statistics: {}",
            summary.repos_with_statistics
        );
        println!(
            "  Contribution records: {} ({} commits)",
            summary.contributions, summary.commits
        );
    }
    println!();

    if summary.is_partial() {
        println!("Partial results; skipped units:");
        for (kind, count) in &summary.skipped {
            println!("  {}: {}", kind, count);
        }
        println!();
    }
}
