//! Markdown report generation
//!
//! Writes the crawl report as a markdown document with one table per kind of
//! anomaly, suitable for attaching to an issue or a CI artifact.

use crate::crawler::CrawlReport;
use crate::output::{page_label, sorted, OutputResult};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown report to `output_path`
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to create or write the file
pub fn write_markdown_report(report: &CrawlReport, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_report(report);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport) -> String {
    let stats = &report.stats;
    let mut md = String::new();

    md.push_str("# Link Check Report\n\n");

    md.push_str("## Overview\n\n");
    md.push_str(&format!("- **Start URL**: {}\n", report.start_url));
    if let Some(started) = stats.started_at {
        md.push_str(&format!("- **Started**: {}\n", started.to_rfc3339()));
    }
    if let Some(finished) = stats.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    md.push_str(&format!(
        "- **Duration**: {:.2} seconds\n",
        stats.elapsed_ms as f64 / 1000.0
    ));
    md.push_str(&format!("- **Links Checked**: {}\n", stats.links_checked));
    md.push_str(&format!("- **Pages Crawled**: {}\n", stats.pages_crawled));
    md.push_str(&format!("- **Broken Links**: {}\n", report.broken_count()));
    md.push_str(&format!(
        "- **Transport Failures**: {}\n\n",
        stats.transport_failures
    ));

    let sources = report.source_pages();

    if report.broken_count() > 0 {
        md.push_str("## Broken Links\n\n");
        md.push_str("| Page | Link | Kind |\n");
        md.push_str("|------|------|------|\n");
        for source in &sources {
            for target in sorted(&report.client_errors, source) {
                md.push_str(&format!("| {} | {} | 4xx |\n", page_label(source), target));
            }
            for target in sorted(&report.server_errors, source) {
                md.push_str(&format!("| {} | {} | 5xx |\n", page_label(source), target));
            }
        }
        md.push('\n');
    }

    if !report.redirects.is_empty() {
        md.push_str("## Permanent Redirects\n\n");
        md.push_str("| Page | Link | Now At |\n");
        md.push_str("|------|------|--------|\n");
        for source in &sources {
            for record in sorted(&report.redirects, source) {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    page_label(source),
                    record.target,
                    record.final_url
                ));
            }
        }
        md.push('\n');
    }

    if !report.temporary_redirects.is_empty() {
        md.push_str("## Temporary Redirects\n\n");
        md.push_str("| Page | Link | Now At |\n");
        md.push_str("|------|------|--------|\n");
        for source in &sources {
            for record in sorted(&report.temporary_redirects, source) {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    page_label(source),
                    record.target,
                    record.final_url
                ));
            }
        }
        md.push('\n');
    }

    if !report.unreachable.is_empty() {
        md.push_str("## Unreachable Links\n\n");
        md.push_str("| Page | Link | Reason |\n");
        md.push_str("|------|------|--------|\n");
        for source in &sources {
            for record in sorted(&report.unreachable, source) {
                md.push_str(&format!(
                    "| {} | {} | {} |\n",
                    page_label(source),
                    record.target,
                    record.reason.replace('|', "\\|")
                ));
            }
        }
        md.push('\n');
    }

    md
}
