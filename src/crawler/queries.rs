//! Query texts and response shapes
//!
//! The query strings are sent verbatim; the crawler never parses or
//! generates them. The structs below mirror only the parts of each
//! response the crawler reads.

use crate::crawler::Page;
use crate::model::{Repo, User};
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Page size for every paginated connection
pub const PAGE_SIZE: u32 = 100;

/// Stargazers per batched repository query
pub const USER_BATCH_SIZE: usize = 50;

/// Stargazers of a repository, oldest star first
pub const STARGAZERS_QUERY: &str = r#"
query StargazersQuery($owner: String!, $name: String!, $cursor: String, $first: Int!) {
  repository(owner: $owner, name: $name) {
    stargazers(first: $first, after: $cursor, orderBy: {field: STARRED_AT, direction: ASC}) {
      totalCount
      pageInfo {
        hasNextPage
        endCursor
      }
      edges {
        starredAt
        node {
          id
          login
          name
          email
          company
          location
          bio
          avatarUrl
          url
          followers {
            totalCount
          }
          following {
            totalCount
          }
          createdAt
          updatedAt
        }
      }
    }
  }
}
"#;

/// Followers of one user
pub const FOLLOWERS_QUERY: &str = r#"
query FollowersQuery($login: String!, $cursor: String, $first: Int!) {
  user(login: $login) {
    followers(first: $first, after: $cursor) {
      totalCount
      pageInfo {
        hasNextPage
        endCursor
      }
      nodes {
        id
        login
        name
        email
        avatarUrl
        url
      }
    }
  }
}
"#;

/// Starred and watched repositories for a batch of users, addressed by node id
pub const USER_REPOSITORIES_QUERY: &str = r#"
query UserRepositoriesQuery($ids: [ID!]!) {
  nodes(ids: $ids) {
    ... on User {
      id
      login
      starredRepositories(first: 100) {
        totalCount
        nodes {
          nameWithOwner
          stargazerCount
          forkCount
          issues(states: OPEN) {
            totalCount
          }
        }
      }
      watching(first: 100) {
        totalCount
        nodes {
          nameWithOwner
          stargazerCount
          forkCount
          issues(states: OPEN) {
            totalCount
          }
        }
      }
    }
  }
}
"#;

/// Collaborators of a repository with their aggregate contribution counters
pub const COLLABORATORS_QUERY: &str = r#"
query CollaboratorsQuery($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    collaborators(first: 100) {
      totalCount
      nodes {
        login
        contributionsCollection {
          totalCommitContributions
          totalIssueContributions
          totalPullRequestContributions
          totalPullRequestReviewContributions
        }
      }
    }
  }
}
"#;

/// Most recent commits on the default branch with line counts
pub const COMMIT_HISTORY_QUERY: &str = r#"
query CommitHistoryQuery($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    defaultBranchRef {
      target {
        ... on Commit {
          history(first: 100) {
            totalCount
            edges {
              node {
                author {
                  user {
                    login
                  }
                }
                additions
                deletions
                committedDate
              }
            }
          }
        }
      }
    }
  }
}
"#;

// ===== Shared shapes =====

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalCount {
    pub total_count: u64,
}

/// A user node; follower nodes fill only some of these fields
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserNode {
    pub id: String,
    pub login: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub url: Option<String>,
    pub followers: TotalCount,
    pub following: TotalCount,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<UserNode> for User {
    fn from(node: UserNode) -> Self {
        Self {
            id: node.id,
            login: node.login,
            name: non_empty(node.name),
            email: non_empty(node.email),
            company: non_empty(node.company),
            location: non_empty(node.location),
            bio: non_empty(node.bio),
            avatar_url: non_empty(node.avatar_url),
            url: non_empty(node.url),
            followers_count: node.followers.total_count,
            following_count: node.following.total_count,
            created_at: node.created_at,
            updated_at: node.updated_at,
        }
    }
}

/// The API reports hidden fields as empty strings
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

// ===== Stargazers =====

#[derive(Debug, Deserialize)]
pub struct StargazersData {
    pub repository: Option<StargazersRepository>,
}

#[derive(Debug, Deserialize)]
pub struct StargazersRepository {
    pub stargazers: StargazerConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StargazerConnection {
    #[serde(default)]
    pub total_count: u64,
    pub page_info: PageInfo,
    #[serde(default)]
    pub edges: Vec<StargazerEdge>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StargazerEdge {
    pub starred_at: Option<DateTime<Utc>>,
    pub node: UserNode,
}

impl StargazerConnection {
    pub fn into_page(self) -> Page<(User, Option<DateTime<Utc>>)> {
        Page {
            items: self
                .edges
                .into_iter()
                .map(|edge| (User::from(edge.node), edge.starred_at))
                .collect(),
            has_next: self.page_info.has_next_page,
            end_cursor: self.page_info.end_cursor,
        }
    }
}

// ===== Followers =====

#[derive(Debug, Deserialize)]
pub struct FollowersData {
    pub user: Option<FollowersUser>,
}

#[derive(Debug, Deserialize)]
pub struct FollowersUser {
    pub followers: FollowerConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowerConnection {
    #[serde(default)]
    pub total_count: u64,
    pub page_info: PageInfo,
    #[serde(default)]
    pub nodes: Vec<Option<UserNode>>,
}

impl FollowerConnection {
    pub fn into_page(self) -> Page<User> {
        Page {
            items: self.nodes.into_iter().flatten().map(User::from).collect(),
            has_next: self.page_info.has_next_page,
            end_cursor: self.page_info.end_cursor,
        }
    }
}

// ===== Starred / watched repositories =====

#[derive(Debug, Deserialize)]
pub struct UserRepositoriesData {
    #[serde(default)]
    pub nodes: Vec<Option<UserRepositoriesNode>>,
}

/// Non-user ids resolve to an empty object, hence the defaults
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRepositoriesNode {
    pub id: String,
    pub login: String,
    pub starred_repositories: RepoConnection,
    pub watching: RepoConnection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RepoConnection {
    pub total_count: u64,
    pub nodes: Vec<Option<RepoNode>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoNode {
    pub name_with_owner: String,
    #[serde(default)]
    pub stargazer_count: u64,
    #[serde(default)]
    pub fork_count: u64,
    #[serde(default)]
    pub issues: TotalCount,
}

impl RepoNode {
    pub fn to_repo(&self) -> Repo {
        Repo::new(
            &self.name_with_owner,
            self.stargazer_count,
            self.fork_count,
            self.issues.total_count,
        )
    }
}

// ===== Collaborators =====

#[derive(Debug, Deserialize)]
pub struct CollaboratorsData {
    pub repository: Option<CollaboratorsRepository>,
}

#[derive(Debug, Deserialize)]
pub struct CollaboratorsRepository {
    pub collaborators: Option<CollaboratorConnection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CollaboratorConnection {
    pub nodes: Vec<Option<CollaboratorNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaboratorNode {
    pub login: String,
    #[serde(default)]
    pub contributions_collection: ContributionsCollection,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContributionsCollection {
    pub total_commit_contributions: u64,
    pub total_issue_contributions: u64,
    pub total_pull_request_contributions: u64,
    pub total_pull_request_review_contributions: u64,
}

// ===== Commit history =====

#[derive(Debug, Deserialize)]
pub struct CommitHistoryData {
    pub repository: Option<CommitHistoryRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitHistoryRepository {
    pub default_branch_ref: Option<BranchRef>,
}

#[derive(Debug, Deserialize)]
pub struct BranchRef {
    pub target: Option<BranchTarget>,
}

/// A non-commit target resolves to an empty object
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BranchTarget {
    pub history: Option<HistoryConnection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HistoryConnection {
    pub edges: Vec<Option<CommitEdge>>,
}

#[derive(Debug, Deserialize)]
pub struct CommitEdge {
    pub node: CommitNode,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitNode {
    pub author: Option<CommitAuthor>,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    pub committed_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct CommitAuthor {
    pub user: Option<AuthorUser>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorUser {
    pub login: String,
}

impl CommitNode {
    /// Login of the GitHub user who authored the commit, if linked to one
    pub fn author_login(&self) -> Option<&str> {
        self.author
            .as_ref()
            .and_then(|author| author.user.as_ref())
            .map(|user| user.login.as_str())
            .filter(|login| !login.is_empty())
    }
}

impl CommitHistoryData {
    /// All commits in the returned history, empty for repositories without one
    pub fn into_commits(self) -> Vec<CommitNode> {
        self.repository
            .and_then(|repo| repo.default_branch_ref)
            .and_then(|branch| branch.target)
            .and_then(|target| target.history)
            .map(|history| history.edges.into_iter().flatten().map(|e| e.node).collect())
            .unwrap_or_default()
    }
}
