//! The flat, immutable configuration of a single crawl run

use crate::config::settings::Settings;
use crate::config::validation::validate_endpoint;
use crate::config::{Mode, ThresholdPolicy, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::ConfigError;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// A repository identifier of the form "owner/name"
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Returns "owner/name"
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if !owner.is_empty() && !name.is_empty() => {
                Ok(Self {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => Err(ConfigError::InvalidRepository(s.to_string())),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Everything a run needs, resolved once before any network activity
#[derive(Clone)]
pub struct CrawlConfig {
    pub repository: RepoId,
    pub token: String,
    pub cache_dir: PathBuf,
    pub mode: Mode,
    pub policy: ThresholdPolicy,
    pub endpoint: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl CrawlConfig {
    /// Builds a configuration with default API settings
    ///
    /// Fails with [`ConfigError::InvalidRepository`] or
    /// [`ConfigError::InvalidMode`] before anything touches the network.
    pub fn new(
        repository: &str,
        token: impl Into<String>,
        cache_dir: impl Into<PathBuf>,
        mode: &str,
    ) -> Result<Self, ConfigError> {
        let repository = repository.parse::<RepoId>()?;
        let mode = mode.parse::<Mode>()?;

        Ok(Self {
            repository,
            token: token.into(),
            cache_dir: cache_dir.into(),
            mode,
            policy: ThresholdPolicy::for_mode(mode),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    /// Builds a configuration from a loaded settings file
    pub fn from_settings(settings: &Settings, token: String) -> Result<Self, ConfigError> {
        let config = Self::new(
            &settings.crawl.repository,
            token,
            &settings.crawl.cache_dir,
            &settings.crawl.mode,
        )?;

        validate_endpoint(&settings.api.endpoint)?;

        Ok(Self {
            endpoint: settings.api.endpoint.clone(),
            timeout: Duration::from_secs(settings.api.timeout_secs),
            user_agent: settings.api.user_agent.clone(),
            ..config
        })
    }

    /// Points the run at a different GraphQL endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into();
        validate_endpoint(&endpoint)?;
        self.endpoint = endpoint;
        Ok(self)
    }
}

impl fmt::Debug for CrawlConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrawlConfig")
            .field("repository", &self.repository)
            .field("token", &"<redacted>")
            .field("cache_dir", &self.cache_dir)
            .field("mode", &self.mode)
            .field("policy", &self.policy)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
