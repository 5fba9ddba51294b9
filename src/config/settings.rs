use crate::config::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use serde::Deserialize;

/// Contents of a Stargraph settings file
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub crawl: CrawlSettings,
    #[serde(default)]
    pub api: ApiSettings,
    pub output: OutputSettings,
}

/// What to crawl and where to cache it
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlSettings {
    /// Target repository as "owner/name"
    pub repository: String,

    /// Crawl breadth: "basic" or "full"
    #[serde(default = "default_mode")]
    pub mode: String,

    /// Root directory of the response cache
    #[serde(rename = "cache-dir")]
    pub cache_dir: String,
}

/// Remote API settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiSettings {
    /// GraphQL endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

fn default_mode() -> String {
    "basic".to_string()
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
