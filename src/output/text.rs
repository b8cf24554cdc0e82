//! Terminal report
//!
//! Anomalies are grouped by the page that referenced them, each group
//! annotated with what the site owner is expected to do about it.

use crate::crawler::CrawlReport;
use crate::output::{page_label, sorted};
use std::fmt::Write;

/// Formats a report for the terminal
pub fn format_text_report(report: &CrawlReport) -> String {
    let mut out = String::new();

    // Writing to a String cannot fail
    let _ = write_report(&mut out, report);
    out
}

/// Prints the terminal report to stdout
pub fn print_report(report: &CrawlReport) {
    print!("{}", format_text_report(report));
}

fn write_report(out: &mut String, report: &CrawlReport) -> std::fmt::Result {
    let stats = &report.stats;

    writeln!(out, "=== Link Check Report ===\n")?;
    writeln!(out, "Start URL: {}", report.start_url)?;
    writeln!(out, "  Links checked: {}", stats.links_checked)?;
    writeln!(out, "  Pages crawled: {}", stats.pages_crawled)?;
    writeln!(out, "  Transport failures: {}", stats.transport_failures)?;
    writeln!(out, "  Elapsed: {:.2}s", stats.elapsed_ms as f64 / 1000.0)?;
    writeln!(out)?;

    if report.has_no_anomalies() {
        writeln!(out, "No broken or redirected links found.")?;
        return Ok(());
    }

    for source in report.source_pages() {
        writeln!(out, "Page: {}", page_label(source))?;

        let client_errors = sorted(&report.client_errors, source);
        if !client_errors.is_empty() {
            writeln!(out, "  Client errors (4xx), links MUST be updated or removed:")?;
            for target in client_errors {
                writeln!(out, "    - {}", target)?;
            }
        }

        let server_errors = sorted(&report.server_errors, source);
        if !server_errors.is_empty() {
            writeln!(out, "  Server errors (5xx), targets MAY need investigating:")?;
            for target in server_errors {
                writeln!(out, "    - {}", target)?;
            }
        }

        let redirects = sorted(&report.redirects, source);
        if !redirects.is_empty() {
            writeln!(out, "  Permanent redirects (301), links MAY be updated:")?;
            for record in redirects {
                writeln!(out, "    - {} -> {}", record.target, record.final_url)?;
            }
        }

        let temporary = sorted(&report.temporary_redirects, source);
        if !temporary.is_empty() {
            writeln!(out, "  Temporary redirects:")?;
            for record in temporary {
                writeln!(out, "    - {} -> {}", record.target, record.final_url)?;
            }
        }

        let unreachable = sorted(&report.unreachable, source);
        if !unreachable.is_empty() {
            writeln!(out, "  Unreachable:")?;
            for record in unreachable {
                writeln!(out, "    - {} ({})", record.target, record.reason)?;
            }
        }

        writeln!(out)?;
    }

    writeln!(
        out,
        "Summary: {} broken, {} redirected, {} unreachable",
        report.broken_count(),
        report.redirects.values().map(Vec::len).sum::<usize>(),
        report.unreachable.values().map(Vec::len).sum::<usize>()
    )?;

    Ok(())
}
