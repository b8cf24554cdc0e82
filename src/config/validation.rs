use crate::config::types::{CrawlConfig, CrawlerSettings, Settings, UserAgentConfig};
use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Upper bound on redirect hops followed per request
const MAX_REDIRECT_LIMIT: usize = 50;

/// Validates the contents of a settings file
pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    validate_crawler_settings(&settings.crawler)?;
    validate_user_agent_config(&settings.user_agent)?;
    Ok(())
}

/// Validates a fully built crawl configuration
///
/// Called before any crawl starts; a configuration that fails here never
/// produces a single request.
pub fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_workers(config.max_workers)?;
    validate_timeout(config.timeout)?;
    validate_frontier_capacity(config.frontier_capacity, config.max_workers)?;
    validate_max_redirects(config.max_redirects)?;

    if config.start_url.scheme() != "http" && config.start_url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "start URL must use http or https, got '{}'",
            config.start_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler settings
fn validate_crawler_settings(settings: &CrawlerSettings) -> Result<(), ConfigError> {
    validate_workers(settings.workers)?;
    validate_timeout(Duration::from_secs(settings.timeout_secs))?;
    validate_frontier_capacity(settings.frontier_capacity, settings.workers)?;
    validate_max_redirects(settings.max_redirects)?;
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact_url) = &config.contact_url {
        Url::parse(contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

fn validate_workers(workers: usize) -> Result<(), ConfigError> {
    if workers < 1 {
        return Err(ConfigError::Validation(format!(
            "workers must be >= 1, got {}",
            workers
        )));
    }
    Ok(())
}

fn validate_timeout(timeout: Duration) -> Result<(), ConfigError> {
    if timeout.is_zero() {
        return Err(ConfigError::Validation(
            "timeout must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// A frontier smaller than the worker pool could leave seeded work unreachable
fn validate_frontier_capacity(capacity: usize, workers: usize) -> Result<(), ConfigError> {
    if capacity < workers {
        return Err(ConfigError::Validation(format!(
            "frontier_capacity must be >= workers ({}), got {}",
            workers, capacity
        )));
    }
    Ok(())
}

fn validate_max_redirects(max_redirects: usize) -> Result<(), ConfigError> {
    if !(1..=MAX_REDIRECT_LIMIT).contains(&max_redirects) {
        return Err(ConfigError::Validation(format!(
            "max_redirects must be between 1 and {}, got {}",
            MAX_REDIRECT_LIMIT, max_redirects
        )));
    }
    Ok(())
}
