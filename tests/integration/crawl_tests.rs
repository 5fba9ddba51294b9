//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the GraphQL endpoint and test
//! the full crawl cycle end-to-end, including the response cache and
//! persistence of the finished graph.

use serde_json::{json, Value};
use stargraph::crawler::{crawl, QueryError};
use stargraph::state::UnitKind;
use stargraph::storage::{GraphStore, RunStatus, SqliteStorage};
use stargraph::{ConfigError, CrawlConfig, CrawlError};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointed at the mock server
fn create_test_config(server: &MockServer, cache_dir: &Path, mode: &str) -> CrawlConfig {
    CrawlConfig::new("octo/target", "test-token", cache_dir, mode)
        .expect("valid config")
        .with_endpoint(format!("{}/graphql", server.uri()))
        .expect("valid endpoint")
}

fn data(payload: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "data": payload }))
}

fn stargazer_page(logins: &[&str], next_cursor: Option<&str>) -> ResponseTemplate {
    let edges: Vec<Value> = logins
        .iter()
        .map(|login| {
            json!({
                "starredAt": "2021-03-04T05:06:07Z",
                "node": {
                    "id": format!("U_{}", login),
                    "login": login,
                    "name": login.to_uppercase(),
                    "followers": {"totalCount": 1},
                    "following": {"totalCount": 2}
                }
            })
        })
        .collect();

    data(json!({"repository": {"stargazers": {
        "totalCount": edges.len(),
        "pageInfo": {"hasNextPage": next_cursor.is_some(), "endCursor": next_cursor},
        "edges": edges
    }}}))
}

fn follower_page(logins: &[&str]) -> ResponseTemplate {
    let nodes: Vec<Value> = logins
        .iter()
        .map(|login| json!({"id": format!("U_{}", login), "login": login}))
        .collect();

    data(json!({"user": {"followers": {
        "totalCount": nodes.len(),
        "pageInfo": {"hasNextPage": false, "endCursor": null},
        "nodes": nodes
    }}}))
}

fn repo_node(name: &str, stars: u64, forks: u64, issues: u64) -> Value {
    json!({
        "nameWithOwner": name,
        "stargazerCount": stars,
        "forkCount": forks,
        "issues": {"totalCount": issues}
    })
}

async fn mount_stargazers(server: &MockServer, logins: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("StargazersQuery"))
        .respond_with(stargazer_page(logins, None))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_basic_crawl_paginates_stargazers() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    // Second page first: the more specific mock must win
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("StargazersQuery"))
        .and(body_string_contains(r#""cursor":"page-2""#))
        .respond_with(stargazer_page(&["carol"], None))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_string_contains("StargazersQuery"))
        .respond_with(stargazer_page(&["alice", "bob"], Some("page-2")))
        .expect(1)
        .mount(&server)
        .await;

    let graph = crawl(create_test_config(&server, cache.path(), "basic"))
        .await
        .expect("crawl succeeds");

    let logins: Vec<_> = graph.stargazers.iter().map(|s| s.login()).collect();
    assert_eq!(logins, vec!["alice", "bob", "carol"]);
    assert_eq!(graph.stargazers[0].user.name.as_deref(), Some("ALICE"));
    assert_eq!(graph.stargazers[0].user.following_count, 2);
    assert!(graph.stargazers[0].starred_at.is_some());
    assert!(graph.repos.is_empty());
    assert!(!graph.report.is_partial());
}

#[tokio::test]
async fn test_second_run_is_served_from_cache() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("StargazersQuery"))
        .respond_with(stargazer_page(&["alice", "bob"], None))
        .expect(1)
        .mount(&server)
        .await;

    let first = crawl(create_test_config(&server, cache.path(), "basic"))
        .await
        .unwrap();
    let second = crawl(create_test_config(&server, cache.path(), "basic"))
        .await
        .unwrap();

    assert_eq!(first.stargazers, second.stargazers);
    assert!(cache.path().join("octo").join("target").join("graphql").is_dir());
}

#[tokio::test]
async fn test_stargazer_failure_aborts_run() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let result = crawl(create_test_config(&server, cache.path(), "full")).await;

    match result {
        Err(CrawlError::Stargazers { repository, source }) => {
            assert_eq!(repository, "octo/target");
            assert!(matches!(source, QueryError::Status { status: 502, .. }));
        }
        other => panic!("expected stargazer failure, got {:?}", other.map(|_| ())),
    }

    // Failures are never cached
    let graphql_dir = cache.path().join("octo").join("target").join("graphql");
    let cached = std::fs::read_dir(&graphql_dir).map(|d| d.count()).unwrap_or(0);
    assert_eq!(cached, 0);
}

#[tokio::test]
async fn test_graphql_error_list_is_a_failure() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"repository": null},
            "errors": [{"type": "NOT_FOUND", "message": "Could not resolve to a Repository"}]
        })))
        .mount(&server)
        .await;

    let result = crawl(create_test_config(&server, cache.path(), "basic")).await;

    assert!(matches!(
        result,
        Err(CrawlError::Stargazers {
            source: QueryError::GraphQl(_),
            ..
        })
    ));
}

#[tokio::test]
async fn test_invalid_mode_fails_before_network() {
    let server = MockServer::start().await;

    let result = CrawlConfig::new("octo/target", "test-token", "./cache", "turbo");

    assert!(matches!(result, Err(ConfigError::InvalidMode(_))));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_full_crawl_end_to_end() {
    let server = MockServer::start().await;
    let cache = TempDir::new().unwrap();

    mount_stargazers(&server, &["alice", "bob"]).await;

    // bob's followers fail; alice's succeed
    Mock::given(method("POST"))
        .and(body_string_contains("FollowersQuery"))
        .and(body_string_contains(r#""login":"bob""#))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("FollowersQuery"))
        .respond_with(follower_page(&["fan1", "fan2"]))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("UserRepositoriesQuery"))
        .respond_with(data(json!({"nodes": [
            {
                "id": "U_alice",
                "login": "alice",
                "starredRepositories": {"totalCount": 2, "nodes": [
                    repo_node("acme/widget", 500, 40, 7),
                    repo_node("tiny/toy", 3, 0, 0)
                ]},
                "watching": {"totalCount": 2, "nodes": [
                    repo_node("acme/widget", 500, 40, 7),
                    repo_node("tiny/toy", 3, 0, 0)
                ]}
            },
            {
                "id": "U_bob",
                "login": "bob",
                "starredRepositories": {"totalCount": 0, "nodes": []},
                "watching": {"totalCount": 1, "nodes": [repo_node("acme/widget", 500, 40, 7)]}
            }
        ]})))
        .expect(1)
        .mount(&server)
        .await;

    // Collaborators need push access; the crawl falls back to commit history
    Mock::given(method("POST"))
        .and(body_string_contains("CollaboratorsQuery"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"repository": {"collaborators": null}},
            "errors": [{"type": "FORBIDDEN", "message": "Must have push access"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(body_string_contains("CommitHistoryQuery"))
        .and(body_string_contains(r#""name":"widget""#))
        .respond_with(data(json!({"repository": {"defaultBranchRef": {"target": {"history": {"edges": [
            {"node": {"author": {"user": {"login": "alice"}}, "additions": 10, "deletions": 2}},
            {"node": {"author": {"user": {"login": "alice"}}, "additions": 5, "deletions": 0}},
            {"node": {"author": {"user": {"login": "stranger"}}, "additions": 99, "deletions": 99}}
        ]}}}}})))
        .expect(1)
        .mount(&server)
        .await;

    let graph = crawl(create_test_config(&server, cache.path(), "full"))
        .await
        .expect("partial failures do not fail the run");

    // Followers: bob's failure is contained
    assert_eq!(graph.stargazers[0].followers.len(), 2);
    assert!(graph.stargazers[1].followers.is_empty());
    let skipped: Vec<_> = graph.report.skipped_of(UnitKind::Followers).collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].subject, "bob");

    // Repositories are deduplicated across stargazers
    assert_eq!(graph.repos.len(), 2);
    assert_eq!(graph.stargazers[0].starred, vec!["acme/widget", "tiny/toy"]);

    // Only the qualifying repository gets statistics
    assert!(graph.repos["tiny/toy"].statistics.is_none());
    let statistics = graph.repos["acme/widget"].statistics.as_ref().unwrap();
    assert!(!statistics.contains_key("stranger"));

    // Missing push access degrades the statistics and is reported
    let collaborators: Vec<_> = graph.report.skipped_of(UnitKind::Collaborators).collect();
    assert_eq!(collaborators.len(), 1);
    assert_eq!(collaborators[0].subject, "acme/widget");

    let alice = &graph.stargazers[0].contributions["acme/widget"];
    assert_eq!((alice.commits, alice.additions, alice.deletions), (2, 15, 2));
    assert!(graph.stargazers[1].contributions.is_empty());
    assert_eq!(graph.report.qualifying_subscriptions, 2);

    // Persist and read back
    let db_dir = TempDir::new().unwrap();
    let mut storage = SqliteStorage::new(&db_dir.path().join("stargraph.db")).unwrap();
    let run_id = storage.create_run("octo/target", "full", "hash").unwrap();
    storage.save_graph(run_id, &graph).unwrap();

    assert_eq!(storage.count_stargazers().unwrap(), 2);
    assert_eq!(storage.count_follower_edges().unwrap(), 2);
    assert_eq!(storage.count_repos().unwrap(), 2);
    assert_eq!(storage.count_repos_with_statistics().unwrap(), 1);
    assert_eq!(storage.count_contributions().unwrap(), 1);
    assert_eq!(storage.get_run(run_id).unwrap().status, RunStatus::Partial);
}
