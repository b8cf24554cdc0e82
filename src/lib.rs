//! SiteQA: a single-site link checker
//!
//! This crate crawls every page reachable from a start URL by following
//! same-site hyperlinks, checks each discovered link, and reports broken,
//! server-failing and permanently redirected links grouped by the page that
//! referenced them.

pub mod config;
pub mod crawler;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for SiteQA operations
///
/// Only configuration-time failures surface through this type. Per-link
/// failures are contained inside the crawl and end up in the report.
#[derive(Debug, Error)]
pub enum SiteqaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Transport faults for a single link
///
/// These are recoverable at link granularity: the worker logs them, records
/// the link as unreachable and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}")]
    Connect { url: String },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("Redirect loop detected at {url}")]
    RedirectLoop { url: String },

    #[error("Invalid redirect location {location:?} from {url}")]
    InvalidRedirect { url: String, location: String },

    #[error("Not a fetchable URL: {url}")]
    InvalidUrl { url: String },

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },
}

/// Result type alias for SiteQA operations
pub type Result<T> = std::result::Result<T, SiteqaError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for fetch operations
pub type FetchResult<T> = std::result::Result<T, FetchError>;

// Re-export commonly used types
pub use config::CrawlConfig;
pub use crawler::{crawl, run_crawl, CrawlReport, Crawler, Verdict};
pub use crate::url::{normalize, SiteMatch};
