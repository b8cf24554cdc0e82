//! Crawl engine
//!
//! This module contains the core link-checking logic, including:
//! - HTTP transport with manual redirect following
//! - HTML link extraction
//! - The shared frontier and visited set
//! - Crawlability policy and link classification
//! - The worker pool that ties them together

mod classifier;
mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod policy;
mod report;

pub use classifier::{Classifier, Verdict};
pub use coordinator::Crawler;
pub use fetcher::{build_http_client, Document, HttpTransport, RedirectHop, Response, Transport};
pub use frontier::{DoneGuard, Frontier, FrontierItem, VisitedSet};
pub use parser::{extract_hrefs, extract_links, PageLinks};
pub use policy::{can_parse, CrawlPolicy};
pub use report::{CrawlReport, CrawlStats, RedirectRecord, UnreachableRecord};

use crate::config::CrawlConfig;
use crate::SiteqaError;

/// Crawls the site at `start_url` and reports its broken links
///
/// This is the main entry point for a crawl with default settings for
/// everything but the worker count and per-request timeout.
///
/// # Arguments
///
/// * `start_url` - Where the crawl begins; a missing scheme means `http`
/// * `max_workers` - Number of concurrent workers, at least 1
/// * `timeout_secs` - Per-request timeout in seconds, at least 1
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed; per-link failures are in the report
/// * `Err(SiteqaError)` - The configuration was rejected before any request
pub async fn run_crawl(
    start_url: &str,
    max_workers: usize,
    timeout_secs: u64,
) -> Result<CrawlReport, SiteqaError> {
    let config = CrawlConfig::new(start_url, max_workers, timeout_secs)?;
    crawl(config).await
}

/// Crawls with a fully specified configuration over HTTP
pub async fn crawl(config: CrawlConfig) -> Result<CrawlReport, SiteqaError> {
    let transport = HttpTransport::new(&config)?;
    let crawler = Crawler::new(config, transport)?;
    Ok(crawler.run().await)
}
