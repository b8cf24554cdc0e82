//! Configuration module for SiteQA
//!
//! A crawl is driven by an immutable [`CrawlConfig`]. It can be built
//! directly from a start URL, or from an optional TOML settings file whose
//! values the command line may override.
//!
//! # Example
//!
//! ```no_run
//! use siteqa::config::load_settings;
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("siteqa.toml")).unwrap();
//! let config = settings.crawl_config("https://example.com/").unwrap();
//! println!("Crawling with {} workers", config.max_workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CrawlConfig, CrawlerSettings, Settings, UserAgentConfig, DEFAULT_FRONTIER_CAPACITY,
    DEFAULT_MAX_REDIRECTS, DEFAULT_TIMEOUT_SECS, DEFAULT_WORKERS,
};

// Re-export parser and validation functions
pub use parser::{load_settings, parse_settings};
pub use validation::{validate_crawl_config, validate_settings};
