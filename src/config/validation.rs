use crate::config::settings::{ApiSettings, CrawlSettings, OutputSettings, Settings};
use crate::config::{Mode, RepoId};
use crate::ConfigError;
use url::Url;

/// Validates the entire settings file
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    validate_crawl_settings(&settings.crawl)?;
    validate_api_settings(&settings.api)?;
    validate_output_settings(&settings.output)?;
    Ok(())
}

/// Validates the crawl section
fn validate_crawl_settings(settings: &CrawlSettings) -> Result<(), ConfigError> {
    settings.repository.parse::<RepoId>()?;
    settings.mode.parse::<Mode>()?;

    if settings.cache_dir.is_empty() {
        return Err(ConfigError::Validation(
            "cache_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the API section
pub(crate) fn validate_api_settings(settings: &ApiSettings) -> Result<(), ConfigError> {
    validate_endpoint(&settings.endpoint)?;

    if settings.timeout_secs < 1 || settings.timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be between 1 and 300, got {}",
            settings.timeout_secs
        )));
    }

    if settings.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the output section
fn validate_output_settings(settings: &OutputSettings) -> Result<(), ConfigError> {
    if settings.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that the endpoint is an absolute http(s) URL
pub(crate) fn validate_endpoint(endpoint: &str) -> Result<(), ConfigError> {
    let url = Url::parse(endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", endpoint, e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use http or https",
            endpoint
        )));
    }

    Ok(())
}
