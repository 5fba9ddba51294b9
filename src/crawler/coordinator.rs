//! Crawler coordinator - main crawl orchestration logic
//!
//! The coordinator owns every piece of crawl-wide state and steps through
//! the stages of [`CrawlStage`] one at a time:
//! - Paginating the target repository's stargazers
//! - Paginating each stargazer's followers
//! - Batch-querying starred and watched repositories
//! - Aggregating contributions to qualifying subscribed repositories
//!
//! Every remote call is awaited before the next one is issued. Failures are
//! contained per stargazer, per batch or per repository and recorded in the
//! run's [`CrawlReport`]; only a failed stargazer fetch aborts the run.

use crate::cache::CacheStore;
use crate::config::{CrawlConfig, RepoId};
use crate::crawler::aggregator::aggregate;
use crate::crawler::queries::{
    FollowersData, RepoConnection, StargazersData, UserRepositoriesData, FOLLOWERS_QUERY,
    PAGE_SIZE, STARGAZERS_QUERY, USER_BATCH_SIZE, USER_REPOSITORIES_QUERY,
};
use crate::crawler::{
    paginate, paginate_into, CachedExecutor, GraphQlClient, Page, QueryError, QueryExecutor,
    Variables,
};
use crate::model::{Contribution, CrawlGraph, Repo, Stargazer, User};
use crate::state::{CrawlReport, CrawlStage, UnitKind};
use crate::CrawlError;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

/// Main crawler coordinator structure
pub struct Coordinator<E> {
    config: CrawlConfig,
    executor: CachedExecutor<E>,
    stage: CrawlStage,
    stargazers: Vec<Stargazer>,
    repos: BTreeMap<String, Repo>,
    known_logins: HashSet<String>,
    report: CrawlReport,
}

impl Coordinator<GraphQlClient> {
    /// Creates a coordinator that talks to the configured GraphQL endpoint
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlError)` - The HTTP client could not be built
    pub fn new(config: CrawlConfig) -> Result<Self, CrawlError> {
        let client = GraphQlClient::new(&config)?;
        Ok(Self::with_executor(config, client))
    }
}

impl<E: QueryExecutor> Coordinator<E> {
    /// Creates a coordinator over any query executor
    ///
    /// Responses are cached under the configured cache directory, scoped to
    /// the target repository.
    pub fn with_executor(config: CrawlConfig, executor: E) -> Self {
        let store = CacheStore::new(&config.cache_dir, &config.repository);

        Self {
            executor: CachedExecutor::new(executor, store),
            config,
            stage: CrawlStage::FetchStargazers,
            stargazers: Vec::new(),
            repos: BTreeMap::new(),
            known_logins: HashSet::new(),
            report: CrawlReport::new(),
        }
    }

    pub fn stage(&self) -> CrawlStage {
        self.stage
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn executor(&self) -> &CachedExecutor<E> {
        &self.executor
    }

    /// Runs every stage the mode calls for and returns the finished graph
    pub async fn run(mut self) -> Result<CrawlGraph, CrawlError> {
        tracing::info!(
            "Starting {} crawl of {}",
            self.config.mode,
            self.config.repository
        );
        let start_time = Instant::now();

        while !self.stage.is_terminal() {
            self.step().await?;
        }

        tracing::info!(
            "Crawl completed in {:?}: {} stargazers, {} repositories, {} cache hits, {} queries sent",
            start_time.elapsed(),
            self.stargazers.len(),
            self.repos.len(),
            self.executor.hits(),
            self.executor.misses()
        );
        if self.report.is_partial() {
            tracing::warn!(
                "{} units of work were skipped; the graph is partial",
                self.report.skipped.len()
            );
        }

        Ok(self.into_graph())
    }

    /// Runs the current stage and advances to the next one
    pub async fn step(&mut self) -> Result<(), CrawlError> {
        tracing::debug!("Entering stage {}", self.stage);

        match self.stage {
            CrawlStage::FetchStargazers => self.fetch_stargazers().await?,
            CrawlStage::FetchFollowers => self.fetch_followers().await,
            CrawlStage::FetchUserRepositories => self.fetch_user_repositories().await,
            CrawlStage::FetchContributions => self.fetch_contributions().await,
            CrawlStage::Done => return Ok(()),
        }

        self.stage = self.stage.next(self.config.mode);
        Ok(())
    }

    /// Any failure here is fatal: the rest of the crawl hangs off this list
    async fn fetch_stargazers(&mut self) -> Result<(), CrawlError> {
        let executor = &self.executor;
        let repository = &self.config.repository;

        let fetched = paginate(move |cursor| fetch_stargazer_page(executor, repository, cursor))
            .await
            .map_err(|source| {
                tracing::error!("Failed to fetch stargazers of {}: {}", repository, source);
                CrawlError::Stargazers {
                    repository: repository.full_name(),
                    source,
                }
            })?;

        for (user, starred_at) in fetched {
            self.known_logins.insert(user.login.clone());
            self.stargazers.push(Stargazer::new(user, starred_at));
        }

        tracing::info!(
            "Found {} stargazers of {}",
            self.stargazers.len(),
            self.config.repository
        );
        Ok(())
    }

    async fn fetch_followers(&mut self) {
        let executor = &self.executor;
        let total = self.stargazers.len();
        let mut unique = HashSet::new();

        for (index, stargazer) in self.stargazers.iter_mut().enumerate() {
            let login = stargazer.login().to_string();
            let login_ref = login.as_str();

            let result = paginate_into(&mut stargazer.followers, move |cursor| {
                fetch_follower_page(executor, login_ref, cursor)
            })
            .await;

            if let Err(e) = result {
                tracing::warn!(
                    "Skipping remaining followers of {} ({} fetched): {}",
                    login,
                    stargazer.followers.len(),
                    e
                );
                self.report.skip(UnitKind::Followers, login.as_str(), e);
            }

            self.report.total_followers += stargazer.followers.len();
            unique.extend(stargazer.followers.iter().map(|f| f.login.clone()));

            if (index + 1) % 10 == 0 || index + 1 == total {
                tracing::info!(
                    "Progress: followers fetched for {}/{} stargazers",
                    index + 1,
                    total
                );
            }
        }

        self.report.unique_followers = unique.len();
        tracing::info!(
            "Recorded {} follower edges ({} unique users)",
            self.report.total_followers,
            self.report.unique_followers
        );
    }

    async fn fetch_user_repositories(&mut self) {
        let policy = self.config.policy;
        let batches = self.stargazers.len().div_ceil(USER_BATCH_SIZE);

        for (index, batch) in self.stargazers.chunks_mut(USER_BATCH_SIZE).enumerate() {
            let ids: Vec<String> = batch.iter().map(|s| s.user.id.clone()).collect();
            let variables = Variables::new().with("ids", ids);

            let data: UserRepositoriesData = match self
                .executor
                .fetch_as(USER_REPOSITORIES_QUERY, &variables)
                .await
            {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("Skipping user batch {}/{}: {}", index + 1, batches, e);
                    self.report
                        .skip(UnitKind::UserBatch, format!("batch {}", index + 1), e);
                    continue;
                }
            };

            let mut matched = HashSet::new();
            for node in data.nodes.into_iter().flatten() {
                // Non-user ids resolve to an empty object
                if node.id.is_empty() {
                    continue;
                }
                let Some(stargazer) = batch.iter_mut().find(|s| s.user.id == node.id) else {
                    tracing::warn!(
                        "Batch {} returned unrequested user {} ({})",
                        index + 1,
                        node.login,
                        node.id
                    );
                    self.report.skip(
                        UnitKind::UnmatchedUser,
                        node.login.as_str(),
                        format!("node {} was not requested", node.id),
                    );
                    continue;
                };
                if node.login != stargazer.user.login {
                    tracing::debug!("{} is now known as {}", stargazer.user.login, node.login);
                }
                matched.insert(node.id.clone());

                record_repositories(
                    &mut stargazer.starred,
                    &node.starred_repositories,
                    policy.max_starred,
                    &mut self.repos,
                );
                record_repositories(
                    &mut stargazer.subscribed,
                    &node.watching,
                    policy.max_subscribed,
                    &mut self.repos,
                );
            }

            for stargazer in batch.iter().filter(|s| !matched.contains(&s.user.id)) {
                tracing::warn!(
                    "No user node for {} in batch {}, repositories unknown",
                    stargazer.login(),
                    index + 1
                );
                self.report.skip(
                    UnitKind::UnmatchedUser,
                    stargazer.login(),
                    format!("no user node for {}", stargazer.user.id),
                );
            }

            tracing::info!(
                "Progress: repository batch {}/{} done, {} unique repositories",
                index + 1,
                batches,
                self.repos.len()
            );
        }
    }

    async fn fetch_contributions(&mut self) {
        let policy = self.config.policy;

        for index in 0..self.stargazers.len() {
            let login = self.stargazers[index].login().to_string();
            let subscribed = self.stargazers[index].subscribed.clone();

            for full_name in subscribed {
                let (qualifies, needs_statistics) = match self.repos.get(&full_name) {
                    Some(repo) => (policy.qualifies(repo), repo.statistics.is_none()),
                    None => {
                        tracing::warn!("No repository record for {}, skipping", full_name);
                        self.report.skip(
                            UnitKind::MissingRepo,
                            full_name.as_str(),
                            format!("subscribed by {}", login),
                        );
                        continue;
                    }
                };

                if !qualifies {
                    continue;
                }
                self.report.qualifying_subscriptions += 1;

                if needs_statistics {
                    let statistics = self.query_statistics(&full_name).await;
                    if let Some(repo) = self.repos.get_mut(&full_name) {
                        repo.statistics = Some(statistics);
                    }
                }

                let contribution = self
                    .repos
                    .get(&full_name)
                    .and_then(|repo| repo.statistics.as_ref())
                    .and_then(|statistics| statistics.get(&login))
                    .cloned();

                if let Some(contribution) = contribution {
                    self.report.commits += contribution.commits;
                    self.stargazers[index]
                        .contributions
                        .insert(full_name, contribution);
                }
            }
        }

        tracing::info!(
            "Contribution statistics for {} repositories, {} qualifying subscriptions, {} commits attributed",
            self.repos.values().filter(|r| r.statistics.is_some()).count(),
            self.report.qualifying_subscriptions,
            self.report.commits
        );
    }

    /// A failed repository gets an empty map so it is not queried again
    async fn query_statistics(&mut self, full_name: &str) -> BTreeMap<String, Contribution> {
        let repo = match full_name.parse::<RepoId>() {
            Ok(repo) => repo,
            Err(e) => {
                tracing::warn!("Cannot query statistics for {}: {}", full_name, e);
                self.report.skip(UnitKind::Statistics, full_name, e);
                return BTreeMap::new();
            }
        };

        tracing::debug!("Aggregating contributions for {}", full_name);
        match aggregate(&self.executor, &repo, &self.known_logins).await {
            Ok(aggregation) => {
                if let Some(e) = aggregation.collaborators_error {
                    self.report.skip(UnitKind::Collaborators, full_name, e);
                }
                aggregation.statistics
            }
            Err(e) => {
                tracing::warn!("Skipping statistics for {}: {}", full_name, e);
                self.report.skip(UnitKind::Statistics, full_name, e);
                BTreeMap::new()
            }
        }
    }

    fn into_graph(self) -> CrawlGraph {
        CrawlGraph {
            repository: self.config.repository,
            mode: self.config.mode,
            stargazers: self.stargazers,
            repos: self.repos,
            report: self.report,
        }
    }
}

/// Appends repository names up to `cap`, registering unseen repositories
///
/// Entries past the cap are dropped entirely. An existing record in `repos`
/// is never replaced.
fn record_repositories(
    names: &mut Vec<String>,
    connection: &RepoConnection,
    cap: usize,
    repos: &mut BTreeMap<String, Repo>,
) {
    for node in connection.nodes.iter().flatten() {
        if names.len() >= cap {
            break;
        }
        names.push(node.name_with_owner.clone());
        repos
            .entry(node.name_with_owner.clone())
            .or_insert_with(|| node.to_repo());
    }
}

fn page_variables(cursor: Option<String>) -> Variables {
    let mut variables = Variables::new().with("first", PAGE_SIZE);
    if let Some(cursor) = cursor {
        variables.insert("cursor", cursor);
    }
    variables
}

async fn fetch_stargazer_page<E: QueryExecutor>(
    executor: &CachedExecutor<E>,
    repository: &RepoId,
    cursor: Option<String>,
) -> Result<Page<(User, Option<DateTime<Utc>>)>, QueryError> {
    let variables = page_variables(cursor)
        .with("owner", repository.owner.as_str())
        .with("name", repository.name.as_str());

    let data: StargazersData = executor.fetch_as(STARGAZERS_QUERY, &variables).await?;
    let repo = data
        .repository
        .ok_or_else(|| QueryError::NotFound(repository.full_name()))?;

    Ok(repo.stargazers.into_page())
}

async fn fetch_follower_page<E: QueryExecutor>(
    executor: &CachedExecutor<E>,
    login: &str,
    cursor: Option<String>,
) -> Result<Page<User>, QueryError> {
    let variables = page_variables(cursor).with("login", login);

    let data: FollowersData = executor.fetch_as(FOLLOWERS_QUERY, &variables).await?;
    let user = data
        .user
        .ok_or_else(|| QueryError::NotFound(login.to_string()))?;

    Ok(user.followers.into_page())
}
