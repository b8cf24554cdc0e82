//! SiteQA main entry point
//!
//! This is the command-line interface for the SiteQA link checker.

use anyhow::Context;
use clap::Parser;
use siteqa::config::{load_settings, CrawlConfig, Settings};
use siteqa::crawler::{CrawlReport, Crawler, HttpTransport};
use siteqa::output::{format_json_report, print_report, write_markdown_report};
use siteqa::SiteMatch;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status for a configuration that was rejected before crawling
const EXIT_CONFIG_ERROR: u8 = 2;

/// SiteQA: a link checker for a single website
///
/// SiteQA crawls every page reachable from the start URL through same-site
/// links, checks every link it finds (including links to other sites) and
/// reports broken and permanently redirected links by the page that
/// contains them.
#[derive(Parser, Debug)]
#[command(name = "siteqa")]
#[command(version)]
#[command(about = "Checks a website for broken links", long_about = None)]
struct Cli {
    /// Start URL of the site to check (a missing scheme means http)
    #[arg(value_name = "URL")]
    url: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Number of concurrent workers
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(short, long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Frontier capacity
    #[arg(long, value_name = "N")]
    capacity: Option<usize>,

    /// How URLs are matched against the start URL's site: origin or prefix
    #[arg(long, value_name = "MODE")]
    same_site: Option<SiteMatch>,

    /// Also report redirects whose first hop is not a 301
    #[arg(long)]
    temporary_redirects: bool,

    /// Path to a TOML settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Also write a markdown report to this file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Exit with status 1 when broken links are found
    #[arg(long)]
    fail_on_broken: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    match handle_crawl(&cli, config).await {
        Ok(report) if cli.fail_on_broken && !report.is_clean() => {
            tracing::info!("{} broken links found", report.broken_count());
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so stdout carries only the report.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("siteqa=info,warn"),
            1 => EnvFilter::new("siteqa=debug,info"),
            2 => EnvFilter::new("siteqa=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the crawl configuration from the settings file and CLI overrides
fn build_config(cli: &Cli) -> anyhow::Result<CrawlConfig> {
    let mut settings = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_settings(path)
                .with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => Settings::default(),
    };

    if let Some(workers) = cli.workers {
        settings.crawler.workers = workers;
        if cli.capacity.is_none() {
            settings.crawler.frontier_capacity = settings.crawler.frontier_capacity.max(workers);
        }
    }
    if let Some(timeout) = cli.timeout {
        settings.crawler.timeout_secs = timeout;
    }
    if let Some(capacity) = cli.capacity {
        settings.crawler.frontier_capacity = capacity;
    }
    if let Some(same_site) = cli.same_site {
        settings.crawler.same_site = same_site;
    }
    if cli.temporary_redirects {
        settings.crawler.record_temporary_redirects = true;
    }

    Ok(settings.crawl_config(&cli.url)?)
}

/// Runs the crawl and emits the report in the requested formats
async fn handle_crawl(cli: &Cli, config: CrawlConfig) -> anyhow::Result<CrawlReport> {
    let transport = HttpTransport::new(&config).context("Failed to build HTTP client")?;
    let crawler = Crawler::new(config, transport)?.with_span(tracing::info_span!("crawl"));

    let report = crawler.run().await;

    if cli.json {
        println!("{}", format_json_report(&report)?);
    } else {
        print_report(&report);
    }

    if let Some(path) = &cli.output {
        write_markdown_report(&report, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!("Report written to: {}", path.display());
    }

    Ok(report)
}
