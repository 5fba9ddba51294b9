//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the GraphStore trait.

use crate::model::{CrawlGraph, User};
use crate::storage::schema::{initialize_schema, GRAPH_TABLES};
use crate::storage::traits::{GraphStore, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::path::Path;

const RUN_COLUMNS: &str =
    "id, repository, mode, settings_hash, started_at, finished_at, status, skipped_units";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        repository: row.get(1)?,
        mode: row.get(2)?,
        settings_hash: row.get(3)?,
        started_at: row.get(4)?,
        finished_at: row.get(5)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(6)?).unwrap_or(RunStatus::Failed),
        skipped_units: row.get::<_, i64>(7)? as u64,
    })
}

fn timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|t| t.to_rfc3339())
}

/// Removes a repository's previous graph
fn clear_repository(tx: &Transaction<'_>, repository: &str) -> StorageResult<()> {
    for table in GRAPH_TABLES {
        tx.execute(
            &format!("DELETE FROM {} WHERE repository = ?1", table),
            params![repository],
        )?;
    }
    Ok(())
}

fn insert_stargazers(tx: &Transaction<'_>, run_id: i64, graph: &CrawlGraph) -> StorageResult<()> {
    let repository = graph.repository.full_name();

    let mut stargazer_stmt = tx.prepare(
        "INSERT OR REPLACE INTO stargazers
         (repository, login, position, node_id, name, email, company, location, bio,
          avatar_url, url, followers_count, following_count, created_at, updated_at,
          starred_at, run_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
    )?;
    let mut follower_stmt = tx.prepare(
        "INSERT INTO followers
         (repository, stargazer, position, login, node_id, name, email, avatar_url, url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    )?;
    let mut starred_stmt = tx.prepare(
        "INSERT INTO starred (repository, stargazer, position, full_name) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut subscribed_stmt = tx.prepare(
        "INSERT INTO subscribed (repository, stargazer, position, full_name) VALUES (?1, ?2, ?3, ?4)",
    )?;
    let mut contribution_stmt = tx.prepare(
        "INSERT INTO contributions
         (repository, stargazer, repo_full_name, commits, additions, deletions)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    for (position, stargazer) in graph.stargazers.iter().enumerate() {
        let user: &User = &stargazer.user;
        stargazer_stmt.execute(params![
            repository,
            user.login,
            position,
            user.id,
            user.name,
            user.email,
            user.company,
            user.location,
            user.bio,
            user.avatar_url,
            user.url,
            user.followers_count,
            user.following_count,
            timestamp(user.created_at),
            timestamp(user.updated_at),
            timestamp(stargazer.starred_at),
            run_id,
        ])?;

        for (position, follower) in stargazer.followers.iter().enumerate() {
            follower_stmt.execute(params![
                repository,
                user.login,
                position,
                follower.login,
                follower.id,
                follower.name,
                follower.email,
                follower.avatar_url,
                follower.url,
            ])?;
        }

        for (position, full_name) in stargazer.starred.iter().enumerate() {
            starred_stmt.execute(params![repository, user.login, position, full_name])?;
        }

        for (position, full_name) in stargazer.subscribed.iter().enumerate() {
            subscribed_stmt.execute(params![repository, user.login, position, full_name])?;
        }

        for (full_name, contribution) in &stargazer.contributions {
            contribution_stmt.execute(params![
                repository,
                user.login,
                full_name,
                contribution.commits,
                contribution.additions,
                contribution.deletions,
            ])?;
        }
    }

    Ok(())
}

fn insert_repos(tx: &Transaction<'_>, graph: &CrawlGraph) -> StorageResult<()> {
    let repository = graph.repository.full_name();
    let mut stmt = tx.prepare(
        "INSERT INTO repos
         (repository, full_name, stargazers_count, forks_count, open_issues, has_statistics)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;

    for repo in graph.repos.values() {
        stmt.execute(params![
            repository,
            repo.full_name,
            repo.stargazers_count,
            repo.forks_count,
            repo.open_issues,
            repo.statistics.is_some(),
        ])?;
    }

    Ok(())
}

impl GraphStore for SqliteStorage {
    // ===== Run Management =====

    fn create_run(
        &mut self,
        repository: &str,
        mode: &str,
        settings_hash: &str,
    ) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (repository, mode, settings_hash, started_at, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                repository,
                mode,
                settings_hash,
                now,
                RunStatus::Running.to_db_string()
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                &format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS),
                [],
                run_from_row,
            )
            .optional()?;

        Ok(run)
    }

    fn fail_run(&mut self, run_id: i64) -> StorageResult<()> {
        self.finish_run(run_id, RunStatus::Failed)
    }

    // ===== Graph Persistence =====

    fn save_graph(&mut self, run_id: i64, graph: &CrawlGraph) -> StorageResult<()> {
        let repository = graph.repository.full_name();
        let report = &graph.report;

        let tx = self.conn.transaction()?;

        clear_repository(&tx, &repository)?;
        insert_stargazers(&tx, run_id, graph)?;
        insert_repos(&tx, graph)?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO skipped_units (run_id, kind, subject, reason) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for unit in &report.skipped {
                stmt.execute(params![run_id, unit.kind.to_string(), unit.subject, unit.reason])?;
            }
        }

        let status = if report.is_partial() {
            RunStatus::Partial
        } else {
            RunStatus::Completed
        };
        let updated = tx.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, skipped_units = ?3 WHERE id = ?4",
            params![
                status.to_db_string(),
                Utc::now().to_rfc3339(),
                report.skipped.len(),
                run_id
            ],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }

        tx.commit()?;

        tracing::debug!(
            "Saved {} stargazers and {} repositories for {} (run {})",
            graph.stargazers.len(),
            graph.repos.len(),
            repository,
            run_id
        );
        Ok(())
    }

    fn get_skipped_units(&self, run_id: i64) -> StorageResult<Vec<(String, String, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT kind, subject, reason FROM skipped_units WHERE run_id = ?1 ORDER BY id",
        )?;

        let units = stmt
            .query_map(params![run_id], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(units)
    }

    // ===== Statistics =====

    fn count_stargazers(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM stargazers")
    }

    fn count_follower_edges(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM followers")
    }

    fn count_unique_followers(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(DISTINCT login) FROM followers")
    }

    fn count_repos(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(DISTINCT full_name) FROM repos")
    }

    fn count_repos_with_statistics(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(DISTINCT full_name) FROM repos WHERE has_statistics = 1")
    }

    fn count_contributions(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM contributions")
    }

    fn get_top_subscribed(&self, limit: usize) -> StorageResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT full_name, COUNT(*) AS subscribers
             FROM subscribed
             GROUP BY full_name
             ORDER BY subscribers DESC, full_name
             LIMIT ?1",
        )?;

        let rows = stmt
            .query_map(params![limit], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
