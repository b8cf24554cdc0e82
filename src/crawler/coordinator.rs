//! Crawl coordination
//!
//! A crawl is a fixed pool of worker tasks sharing one frontier, one visited
//! set and one classifier. The coordinator seeds the frontier with the start
//! URL, waits until every enqueued link has been processed, then signals the
//! workers to stop and assembles the report.
//!
//! Per link, a worker:
//! 1. Claims the URL in the visited set (skipping it if already claimed)
//! 2. Checks it with a HEAD request and classifies the response
//! 3. If the response is crawlable, fetches the page with GET
//! 4. Extracts, normalizes and enqueues every link on the page
//!
//! Transport failures and unparseable pages never abort the crawl.

use crate::config::{validate_crawl_config, CrawlConfig};
use crate::crawler::classifier::{Classifier, Verdict};
use crate::crawler::fetcher::Transport;
use crate::crawler::frontier::{Frontier, FrontierItem, VisitedSet};
use crate::crawler::parser::extract_links;
use crate::crawler::policy::CrawlPolicy;
use crate::crawler::report::{CrawlReport, CrawlStats};
use crate::url::normalize;
use crate::{ConfigError, FetchError};
use chrono::Utc;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{Instrument, Span};
use url::Url;

/// Link checker for a single site
///
/// Generic over the transport so the crawl engine can run against anything
/// that answers HEAD and GET.
pub struct Crawler<T> {
    config: CrawlConfig,
    transport: Arc<T>,
    span: Span,
}

impl<T: Transport + 'static> Crawler<T> {
    /// Creates a crawler, validating the configuration first
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(ConfigError)` - The configuration cannot produce a crawl
    pub fn new(config: CrawlConfig, transport: T) -> Result<Self, ConfigError> {
        validate_crawl_config(&config)?;

        Ok(Self {
            config,
            transport: Arc::new(transport),
            span: Span::current(),
        })
    }

    /// Attaches every log line of the crawl to `span`
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Runs the crawl to completion and returns its report
    ///
    /// Every run starts from an empty frontier and visited set, so running
    /// the same crawler twice crawls the site twice.
    pub async fn run(&self) -> CrawlReport {
        let started_at = Utc::now();
        let start_time = Instant::now();
        let start_url = self.config.start_url.to_string();

        let state = Arc::new(CrawlState {
            transport: Arc::clone(&self.transport),
            frontier: Frontier::new(self.config.frontier_capacity),
            visited: VisitedSet::new(),
            classifier: Classifier::new(self.config.record_temporary_redirects),
            policy: CrawlPolicy::new(&self.config.start_url, self.config.site_match),
            timeout: self.config.timeout,
            links_checked: AtomicUsize::new(0),
            pages_crawled: AtomicUsize::new(0),
            transport_failures: AtomicUsize::new(0),
        });

        tracing::info!(
            parent: &self.span,
            "Starting crawl of {} with {} workers (site: {}, matching: {})",
            start_url,
            self.config.max_workers,
            state.policy.base(),
            state.policy.site_match()
        );

        tracing::debug!(parent: &self.span, "Frontier capacity: {}", state.frontier.capacity());
        state.frontier.push(FrontierItem::seed(start_url.clone())).await;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut workers = JoinSet::new();
        for id in 0..self.config.max_workers {
            let worker_span = tracing::debug_span!(parent: &self.span, "worker", id);
            workers.spawn(worker(Arc::clone(&state), shutdown_rx.clone()).instrument(worker_span));
        }
        drop(shutdown_rx);

        {
            let drained = state.frontier.wait_drained();
            tokio::pin!(drained);

            loop {
                tokio::select! {
                    _ = &mut drained => break,
                    joined = workers.join_next() => match joined {
                        Some(Err(e)) => {
                            tracing::error!(parent: &self.span, "Worker failed: {}", e);
                        }
                        Some(Ok(())) => {}
                        None => {
                            tracing::error!(
                                parent: &self.span,
                                "All workers exited with {} links outstanding",
                                state.frontier.outstanding()
                            );
                            break;
                        }
                    },
                }
            }
        }

        // Workers are idle in `pop` now; tell them to stop
        let _ = shutdown_tx.send(true);
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(parent: &self.span, "Worker failed: {}", e);
            }
        }

        let mut report = state.classifier.take_report();
        report.start_url = start_url;
        report.stats = CrawlStats {
            links_checked: state.links_checked.load(Ordering::Relaxed),
            pages_crawled: state.pages_crawled.load(Ordering::Relaxed),
            transport_failures: state.transport_failures.load(Ordering::Relaxed),
            started_at: Some(started_at),
            finished_at: Some(Utc::now()),
            elapsed_ms: u64::try_from(start_time.elapsed().as_millis()).unwrap_or(u64::MAX),
        };

        tracing::info!(
            parent: &self.span,
            "Crawl completed: {} links checked, {} pages crawled, {} broken in {:?}",
            report.stats.links_checked,
            report.stats.pages_crawled,
            report.broken_count(),
            start_time.elapsed()
        );

        report
    }
}

/// State shared by every worker of one run
struct CrawlState<T> {
    transport: Arc<T>,
    frontier: Frontier,
    visited: VisitedSet,
    classifier: Classifier,
    policy: CrawlPolicy,
    timeout: Duration,
    links_checked: AtomicUsize,
    pages_crawled: AtomicUsize,
    transport_failures: AtomicUsize,
}

async fn worker<T: Transport>(state: Arc<CrawlState<T>>, mut shutdown: watch::Receiver<bool>) {
    tracing::trace!("Worker started");

    loop {
        let item = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            item = state.frontier.pop() => item,
        };

        let _done = state.frontier.done_guard();
        state.process(item).await;
    }

    tracing::trace!("Worker stopped");
}

impl<T: Transport> CrawlState<T> {
    async fn process(&self, item: FrontierItem) {
        if !self.visited.insert(&item.target) {
            tracing::trace!("Already visited: {}", item.target);
            return;
        }
        self.links_checked.fetch_add(1, Ordering::Relaxed);

        let source = item.source_key();
        let response = match self.bounded(&item.target, self.transport.head(&item.target)).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to check {} (found on {:?}): {}", item.target, source, e);
                self.transport_failures.fetch_add(1, Ordering::Relaxed);
                self.classifier.record_unreachable(&item.target, source, &e);
                return;
            }
        };

        let verdict = self.classifier.classify(&response, &item.target, source);
        if verdict.is_broken() {
            tracing::info!("Broken link {} ({}) on {:?}", item.target, response.status, source);
        } else if verdict == Verdict::Redirected {
            tracing::info!("Redirected link {} -> {}", item.target, response.final_url);
        } else {
            tracing::debug!("Checked {} ({})", item.target, response.status);
        }

        if !self.policy.is_crawlable(&response) {
            return;
        }

        self.crawl_page(&item.target).await;
    }

    /// Fetches a crawlable page and enqueues the links it contains
    async fn crawl_page(&self, page: &str) {
        let document = match self.bounded(page, self.transport.get(page)).await {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", page, e);
                self.transport_failures.fetch_add(1, Ordering::Relaxed);
                return;
            }
        };

        if !self.policy.is_crawlable(&document.response) {
            tracing::warn!(
                "Skipping {}: full fetch returned {} ({:?})",
                page,
                document.response.status,
                document.response.content_type()
            );
            return;
        }

        let page_url = match Url::parse(&document.response.final_url) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Invalid final URL {:?} for {}: {}", document.response.final_url, page, e);
                return;
            }
        };

        self.pages_crawled.fetch_add(1, Ordering::Relaxed);

        let links = extract_links(&document.body);

        // A <base> element replaces the page URL for resolving relative links
        let base_url = match links.base.as_deref().map(|base| page_url.join(base.trim())) {
            Some(Ok(base_url)) => base_url,
            Some(Err(e)) => {
                tracing::debug!("Ignoring invalid <base> on {}: {}", page, e);
                page_url
            }
            None => page_url,
        };

        let mut seen = HashSet::new();
        let mut queued = 0;
        for href in links.hrefs {
            let Some((link, _fragment)) = normalize(&base_url, &href) else {
                tracing::trace!("Ignoring link {:?} on {}", href, page);
                continue;
            };

            let link = String::from(link);
            if self.visited.contains(&link) || !seen.insert(link.clone()) {
                continue;
            }

            self.frontier.push_discovered(FrontierItem::discovered(page, link));
            queued += 1;
        }

        tracing::debug!("Crawled {}: {} new links queued", page, queued);
    }

    /// Applies the per-request timeout on top of whatever the transport does
    async fn bounded<R, F>(&self, url: &str, request: F) -> Result<R, FetchError>
    where
        F: Future<Output = Result<R, FetchError>>,
    {
        match tokio::time::timeout(self.timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}
