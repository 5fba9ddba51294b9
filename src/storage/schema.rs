//! Database schema definitions
//!
//! Every graph table is keyed by the target repository so a new crawl of
//! one repository can replace its rows without touching other repositories.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    repository TEXT NOT NULL,
    mode TEXT NOT NULL,
    settings_hash TEXT NOT NULL,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    status TEXT NOT NULL,
    skipped_units INTEGER NOT NULL DEFAULT 0
);

-- Units of work a run skipped after a recoverable failure
CREATE TABLE IF NOT EXISTS skipped_units (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    kind TEXT NOT NULL,
    subject TEXT NOT NULL,
    reason TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_skipped_units_run ON skipped_units(run_id);

-- Stargazers of each target repository, in API order
CREATE TABLE IF NOT EXISTS stargazers (
    repository TEXT NOT NULL,
    login TEXT NOT NULL,
    position INTEGER NOT NULL,
    node_id TEXT NOT NULL,
    name TEXT,
    email TEXT,
    company TEXT,
    location TEXT,
    bio TEXT,
    avatar_url TEXT,
    url TEXT,
    followers_count INTEGER NOT NULL,
    following_count INTEGER NOT NULL,
    created_at TEXT,
    updated_at TEXT,
    starred_at TEXT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    PRIMARY KEY (repository, login)
);

-- Followers of each stargazer, in API order
CREATE TABLE IF NOT EXISTS followers (
    repository TEXT NOT NULL,
    stargazer TEXT NOT NULL,
    position INTEGER NOT NULL,
    login TEXT NOT NULL,
    node_id TEXT NOT NULL,
    name TEXT,
    email TEXT,
    avatar_url TEXT,
    url TEXT,
    PRIMARY KEY (repository, stargazer, position)
);

CREATE INDEX IF NOT EXISTS idx_followers_login ON followers(login);

-- Starred repositories per stargazer, capped by policy
CREATE TABLE IF NOT EXISTS starred (
    repository TEXT NOT NULL,
    stargazer TEXT NOT NULL,
    position INTEGER NOT NULL,
    full_name TEXT NOT NULL,
    PRIMARY KEY (repository, stargazer, position)
);

-- Watched repositories per stargazer, capped by policy
CREATE TABLE IF NOT EXISTS subscribed (
    repository TEXT NOT NULL,
    stargazer TEXT NOT NULL,
    position INTEGER NOT NULL,
    full_name TEXT NOT NULL,
    PRIMARY KEY (repository, stargazer, position)
);

CREATE INDEX IF NOT EXISTS idx_subscribed_full_name ON subscribed(full_name);

-- Repositories reached from the stargazers
CREATE TABLE IF NOT EXISTS repos (
    repository TEXT NOT NULL,
    full_name TEXT NOT NULL,
    stargazers_count INTEGER NOT NULL,
    forks_count INTEGER NOT NULL,
    open_issues INTEGER NOT NULL,
    has_statistics INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (repository, full_name)
);

-- A stargazer's contribution to a qualifying subscribed repository
CREATE TABLE IF NOT EXISTS contributions (
    repository TEXT NOT NULL,
    stargazer TEXT NOT NULL,
    repo_full_name TEXT NOT NULL,
    commits INTEGER NOT NULL,
    additions INTEGER NOT NULL,
    deletions INTEGER NOT NULL,
    PRIMARY KEY (repository, stargazer, repo_full_name)
);
"#;

/// Tables holding one repository's graph, cleared before it is saved again
pub const GRAPH_TABLES: &[&str] = &[
    "stargazers",
    "followers",
    "starred",
    "subscribed",
    "repos",
    "contributions",
];

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        initialize_schema(&conn).unwrap();
        let result = initialize_schema(&conn);

        assert!(result.is_ok());
    }

    #[test]
    fn test_tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in GRAPH_TABLES.iter().chain(&["runs", "skipped_units"]) {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }
}
