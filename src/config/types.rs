use crate::config::validation::validate_crawl_config;
use crate::url::{parse_start_url, SiteMatch};
use crate::ConfigError;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

pub const DEFAULT_WORKERS: usize = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FRONTIER_CAPACITY: usize = 1000;
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Immutable input of one crawl
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Normalized, fragment-free start URL
    pub start_url: Url,

    /// Number of concurrent workers
    pub max_workers: usize,

    /// Per-request timeout for both the existence check and the full fetch
    pub timeout: Duration,

    /// Number of frontier items the orchestrator may seed before blocking
    pub frontier_capacity: usize,

    /// Maximum redirect hops followed per request
    pub max_redirects: usize,

    /// How discovered URLs are compared against the site base
    pub site_match: SiteMatch,

    /// Also record redirect chains whose first hop is not a 301
    pub record_temporary_redirects: bool,

    /// Value of the User-Agent header
    pub user_agent: String,
}

impl CrawlConfig {
    /// Builds and validates a crawl configuration with default settings for
    /// everything but the start URL, worker count and timeout
    ///
    /// # Example
    ///
    /// ```
    /// use siteqa::CrawlConfig;
    ///
    /// let config = CrawlConfig::new("http://localhost:8000", 4, 10).unwrap();
    /// assert_eq!(config.start_url.as_str(), "http://localhost:8000/");
    /// assert!(CrawlConfig::new("http://localhost:8000", 0, 10).is_err());
    /// ```
    pub fn new(start_url: &str, max_workers: usize, timeout_secs: u64) -> Result<Self, ConfigError> {
        let config = Self {
            start_url: parse_start_url(start_url)?,
            max_workers,
            timeout: Duration::from_secs(timeout_secs),
            frontier_capacity: DEFAULT_FRONTIER_CAPACITY.max(max_workers),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            site_match: SiteMatch::default(),
            record_temporary_redirects: false,
            user_agent: UserAgentConfig::default().header_value(),
        };

        validate_crawl_config(&config)?;
        Ok(config)
    }

    pub fn with_frontier_capacity(mut self, capacity: usize) -> Self {
        self.frontier_capacity = capacity;
        self
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn with_site_match(mut self, site_match: SiteMatch) -> Self {
        self.site_match = site_match;
        self
    }

    pub fn with_temporary_redirects(mut self, record: bool) -> Self {
        self.record_temporary_redirects = record;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Contents of a TOML settings file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub crawler: CrawlerSettings,

    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

impl Settings {
    /// Builds a validated crawl configuration for `start_url` from these settings
    pub fn crawl_config(&self, start_url: &str) -> Result<CrawlConfig, ConfigError> {
        let config = CrawlConfig {
            start_url: parse_start_url(start_url)?,
            max_workers: self.crawler.workers,
            timeout: Duration::from_secs(self.crawler.timeout_secs),
            frontier_capacity: self.crawler.frontier_capacity,
            max_redirects: self.crawler.max_redirects,
            site_match: self.crawler.same_site,
            record_temporary_redirects: self.crawler.record_temporary_redirects,
            user_agent: self.user_agent.header_value(),
        };

        validate_crawl_config(&config)?;
        Ok(config)
    }
}

/// Crawler behavior settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrawlerSettings {
    /// Number of concurrent workers
    pub workers: usize,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Frontier capacity for seeded items
    #[serde(rename = "frontier-capacity")]
    pub frontier_capacity: usize,

    /// Maximum redirect hops followed per request
    #[serde(rename = "max-redirects")]
    pub max_redirects: usize,

    /// Same-site matching mode ("origin" or "prefix")
    #[serde(rename = "same-site")]
    pub same_site: SiteMatch,

    /// Record non-permanent redirects as an informational category
    #[serde(rename = "record-temporary-redirects")]
    pub record_temporary_redirects: bool,
}

impl Default for CrawlerSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            frontier_capacity: DEFAULT_FRONTIER_CAPACITY,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            same_site: SiteMatch::default(),
            record_temporary_redirects: false,
        }
    }
}

/// User agent identification
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}
