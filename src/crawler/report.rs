//! Crawl report data model
//!
//! Only anomalies are recorded. Every mapping is keyed by the page that
//! referenced the link (the empty string for the start URL). The order of
//! entries within one key depends on worker timing and is not meaningful.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// A link whose redirect chain began with a redirect
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RedirectRecord {
    /// The URL as linked
    pub target: String,

    /// Where the redirect chain ended
    pub final_url: String,
}

/// A link that could not be fetched at all
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct UnreachableRecord {
    pub target: String,
    pub reason: String,
}

/// Counters describing one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Links dispatched for an existence check
    pub links_checked: usize,

    /// Pages fetched in full and parsed for links
    pub pages_crawled: usize,

    /// Existence checks or full fetches that failed in transport
    pub transport_failures: usize,

    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub elapsed_ms: u64,
}

/// Result of one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub start_url: String,

    /// HTTP 4xx: the link MUST be updated or removed
    pub client_errors: BTreeMap<String, Vec<String>>,

    /// HTTP 5xx: the target MAY need investigating
    pub server_errors: BTreeMap<String, Vec<String>>,

    /// Chains whose first hop was a 301: the link MAY be updated
    pub redirects: BTreeMap<String, Vec<RedirectRecord>>,

    /// Chains whose first hop was not a 301; only filled when enabled
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub temporary_redirects: BTreeMap<String, Vec<RedirectRecord>>,

    /// Links that failed in transport (timeout, refused connection, ...)
    pub unreachable: BTreeMap<String, Vec<UnreachableRecord>>,

    pub stats: CrawlStats,
}

impl CrawlReport {
    /// Number of client and server errors
    pub fn broken_count(&self) -> usize {
        count(&self.client_errors) + count(&self.server_errors)
    }

    /// Returns true if no broken links were found
    pub fn is_clean(&self) -> bool {
        self.broken_count() == 0
    }

    /// Returns true if nothing at all was recorded
    pub fn has_no_anomalies(&self) -> bool {
        self.client_errors.is_empty()
            && self.server_errors.is_empty()
            && self.redirects.is_empty()
            && self.temporary_redirects.is_empty()
            && self.unreachable.is_empty()
    }

    /// Every referring page with at least one anomaly, in sorted order
    pub fn source_pages(&self) -> Vec<&str> {
        let mut pages: Vec<&str> = self
            .client_errors
            .keys()
            .chain(self.server_errors.keys())
            .chain(self.redirects.keys())
            .chain(self.temporary_redirects.keys())
            .chain(self.unreachable.keys())
            .map(String::as_str)
            .collect();
        pages.sort_unstable();
        pages.dedup();
        pages
    }
}

fn count<T>(map: &BTreeMap<String, Vec<T>>) -> usize {
    map.values().map(Vec::len).sum()
}
