//! Report rendering
//!
//! This module handles:
//! - A plain-text report grouped by referring page, for the terminal
//! - A JSON document for machine consumption
//! - A markdown summary written to a file

mod markdown;
mod text;

pub use markdown::{format_markdown_report, write_markdown_report};
pub use text::{format_text_report, print_report};

use crate::crawler::CrawlReport;
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Label under which links found on no page (the start URL) are listed
pub const START_PAGE_LABEL: &str = "(start URL)";

/// Serializes a report as pretty-printed JSON
pub fn format_json_report(report: &CrawlReport) -> OutputResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Human-readable name of a referring page
pub(crate) fn page_label(source: &str) -> &str {
    if source.is_empty() {
        START_PAGE_LABEL
    } else {
        source
    }
}

/// Entries of one page, sorted so output does not depend on crawl timing
pub(crate) fn sorted<T: Ord + Clone>(map: &BTreeMap<String, Vec<T>>, source: &str) -> Vec<T> {
    let mut entries = map.get(source).cloned().unwrap_or_default();
    entries.sort();
    entries
}
