//! Contribution aggregation for one repository
//!
//! Two sources describe who contributed to a repository. Collaborator
//! statistics carry only aggregate counters; commit history carries per-commit
//! line counts and is folded per author. The commit-history record wins
//! wherever both sources know a login.

use crate::config::RepoId;
use crate::crawler::queries::{
    CollaboratorsData, CommitHistoryData, COLLABORATORS_QUERY, COMMIT_HISTORY_QUERY,
};
use crate::crawler::{CachedExecutor, QueryError, QueryExecutor, Variables};
use crate::model::Contribution;
use std::collections::{BTreeMap, HashSet};

/// Aggregate counters for one collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollaboratorStats {
    pub login: String,
    pub commits: u64,
}

/// One commit from the default branch history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    /// `None` when the commit is not linked to a user account
    pub author: Option<String>,
    pub additions: u64,
    pub deletions: u64,
}

/// Merges both sources into one record per known login
///
/// Logins outside `known` are dropped from both sources.
pub fn merge_contributions(
    collaborators: &[CollaboratorStats],
    commits: &[CommitRecord],
    known: &HashSet<String>,
) -> BTreeMap<String, Contribution> {
    let mut merged: BTreeMap<String, Contribution> = collaborators
        .iter()
        .filter(|c| known.contains(&c.login))
        .map(|c| {
            let contribution = Contribution {
                commits: c.commits,
                ..Contribution::new(&c.login)
            };
            (c.login.clone(), contribution)
        })
        .collect();

    let mut folded: BTreeMap<&str, Contribution> = BTreeMap::new();
    for commit in commits {
        let Some(login) = commit.author.as_deref() else {
            continue;
        };
        if !known.contains(login) {
            continue;
        }

        let entry = folded
            .entry(login)
            .or_insert_with(|| Contribution::new(login));
        entry.commits += 1;
        entry.additions += commit.additions;
        entry.deletions += commit.deletions;
    }

    for (login, contribution) in folded {
        merged.insert(login.to_string(), contribution);
    }

    merged
}

/// Merged statistics for one repository
#[derive(Debug)]
pub struct Aggregation {
    pub statistics: BTreeMap<String, Contribution>,

    /// Set when the statistics were built from commit history alone
    pub collaborators_error: Option<QueryError>,
}

/// Queries both sources for `repo` and merges them
///
/// A collaborator query failure does not fail the unit: the merge proceeds
/// with commit history alone and the failure is handed back in
/// [`Aggregation::collaborators_error`]. The collaborators field needs push
/// access on most repositories. A commit history failure fails the whole
/// unit.
pub async fn aggregate<E: QueryExecutor>(
    executor: &CachedExecutor<E>,
    repo: &RepoId,
    known: &HashSet<String>,
) -> Result<Aggregation, QueryError> {
    let variables = Variables::new()
        .with("owner", repo.owner.as_str())
        .with("name", repo.name.as_str());

    let (collaborators, collaborators_error) =
        match fetch_collaborators(executor, repo, &variables).await {
            Ok(collaborators) => (collaborators, None),
            Err(e) => {
                tracing::warn!(
                    "Collaborator statistics unavailable for {}, using commit history only: {}",
                    repo,
                    e
                );
                (Vec::new(), Some(e))
            }
        };

    let commits = fetch_commits(executor, repo, &variables).await?;
    let merged = merge_contributions(&collaborators, &commits, known);

    tracing::debug!(
        "Aggregated {} contributions for {} ({} collaborators, {} commits)",
        merged.len(),
        repo,
        collaborators.len(),
        commits.len()
    );

    Ok(Aggregation {
        statistics: merged,
        collaborators_error,
    })
}

async fn fetch_collaborators<E: QueryExecutor>(
    executor: &CachedExecutor<E>,
    repo: &RepoId,
    variables: &Variables,
) -> Result<Vec<CollaboratorStats>, QueryError> {
    let data: CollaboratorsData = executor.fetch_as(COLLABORATORS_QUERY, variables).await?;
    let repository = data
        .repository
        .ok_or_else(|| QueryError::NotFound(repo.full_name()))?;

    Ok(repository
        .collaborators
        .unwrap_or_default()
        .nodes
        .into_iter()
        .flatten()
        .map(|node| CollaboratorStats {
            login: node.login,
            commits: node.contributions_collection.total_commit_contributions,
        })
        .collect())
}

async fn fetch_commits<E: QueryExecutor>(
    executor: &CachedExecutor<E>,
    repo: &RepoId,
    variables: &Variables,
) -> Result<Vec<CommitRecord>, QueryError> {
    let data: CommitHistoryData = executor.fetch_as(COMMIT_HISTORY_QUERY, variables).await?;
    if data.repository.is_none() {
        return Err(QueryError::NotFound(repo.full_name()));
    }

    Ok(data
        .into_commits()
        .into_iter()
        .map(|node| CommitRecord {
            author: node.author_login().map(str::to_string),
            additions: node.additions,
            deletions: node.deletions,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheStore;
    use crate::crawler::RawPayload;
    use tempfile::TempDir;

    fn known(logins: &[&str]) -> HashSet<String> {
        logins.iter().map(|l| l.to_string()).collect()
    }

    fn commit(author: Option<&str>, additions: u64, deletions: u64) -> CommitRecord {
        CommitRecord {
            author: author.map(str::to_string),
            additions,
            deletions,
        }
    }

    #[test]
    fn test_commit_history_wins_on_overlap() {
        let collaborators = vec![CollaboratorStats {
            login: "x".to_string(),
            commits: 5,
        }];
        let commits = vec![
            commit(Some("x"), 4, 1),
            commit(Some("x"), 6, 1),
            commit(Some("x"), 0, 0),
        ];

        let merged = merge_contributions(&collaborators, &commits, &known(&["x"]));

        assert_eq!(
            merged["x"],
            Contribution {
                login: "x".to_string(),
                commits: 3,
                additions: 10,
                deletions: 2,
            }
        );
    }

    #[test]
    fn test_collaborator_only_login_is_kept() {
        let collaborators = vec![CollaboratorStats {
            login: "y".to_string(),
            commits: 9,
        }];

        let merged = merge_contributions(&collaborators, &[], &known(&["y"]));

        assert_eq!(merged["y"].commits, 9);
        assert_eq!(merged["y"].additions, 0);
    }

    #[test]
    fn test_unknown_logins_are_dropped_from_both_sources() {
        let collaborators = vec![CollaboratorStats {
            login: "stranger".to_string(),
            commits: 40,
        }];
        let commits = vec![
            commit(Some("stranger"), 100, 100),
            commit(Some("alice"), 1, 0),
            commit(None, 50, 50),
        ];

        let merged = merge_contributions(&collaborators, &commits, &known(&["alice"]));

        assert_eq!(merged.len(), 1);
        assert_eq!(merged["alice"].commits, 1);
    }

    /// Executor that fails the collaborator query and serves a fixed history
    struct HistoryOnly;

    impl QueryExecutor for HistoryOnly {
        async fn execute(&self, query: &str, _variables: &Variables) -> Result<RawPayload, QueryError> {
            if query == COLLABORATORS_QUERY {
                return Err(QueryError::Status {
                    status: 403,
                    body: "Must have push access".to_string(),
                });
            }
            Ok(RawPayload::from_json(
                r#"{"repository": {"defaultBranchRef": {"target": {"history": {"edges": [
                    {"node": {"author": {"user": {"login": "alice"}}, "additions": 7, "deletions": 3}}
                ]}}}}}"#,
            )?)
        }
    }

    #[tokio::test]
    async fn test_collaborator_failure_falls_back_to_history() {
        let dir = TempDir::new().unwrap();
        let repo: RepoId = "acme/widget".parse().unwrap();
        let executor = CachedExecutor::new(HistoryOnly, CacheStore::new(dir.path(), &repo));

        let aggregation = aggregate(&executor, &repo, &known(&["alice"])).await.unwrap();

        assert!(matches!(
            aggregation.collaborators_error,
            Some(QueryError::Status { status: 403, .. })
        ));
        let merged = &aggregation.statistics;
        assert_eq!(merged["alice"].commits, 1);
        assert_eq!(merged["alice"].additions, 7);
        assert_eq!(merged["alice"].deletions, 3);
    }
}
