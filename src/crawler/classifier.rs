//! Link classification
//!
//! Maps a response to a verdict and records anomalies against the page that
//! referenced the link. The decision is a pure function of the response;
//! recording is a single append behind a lock, so workers may classify
//! concurrently.

use crate::crawler::fetcher::Response;
use crate::crawler::report::{CrawlReport, RedirectRecord, UnreachableRecord};
use crate::FetchError;
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Outcome of checking one link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Verdict {
    /// Success without any redirect; not recorded
    Ok,

    /// HTTP 4xx
    ClientError,

    /// HTTP 5xx
    ServerError,

    /// Redirect chain whose first hop was a 301
    Redirected,

    /// Redirected through a non-301 first hop, or a 3xx without history;
    /// not an error and not recorded by default
    Mixed,
}

impl Verdict {
    /// Decides the verdict for a response
    ///
    /// # Decision Table
    ///
    /// Evaluated in order:
    ///
    /// | Condition | Verdict |
    /// |-----------|---------|
    /// | status < 300, no redirect history | `Ok` |
    /// | 400 <= status < 500 | `ClientError` |
    /// | status >= 500 | `ServerError` |
    /// | first redirect hop was a 301 | `Redirected` |
    /// | anything else | `Mixed` |
    pub fn of(response: &Response) -> Self {
        let status = response.status;

        if status < 300 && !response.was_redirected() {
            Self::Ok
        } else if (400..500).contains(&status) {
            Self::ClientError
        } else if status >= 500 {
            Self::ServerError
        } else if response.history.first().map(|hop| hop.status) == Some(301) {
            Self::Redirected
        } else {
            Self::Mixed
        }
    }

    /// Returns true for verdicts that mean the link is broken
    pub fn is_broken(self) -> bool {
        matches!(self, Self::ClientError | Self::ServerError)
    }
}

/// Shared classification sink for one crawl
#[derive(Debug, Default)]
pub struct Classifier {
    report: Mutex<CrawlReport>,
    record_temporary_redirects: bool,
}

impl Classifier {
    pub fn new(record_temporary_redirects: bool) -> Self {
        Self {
            report: Mutex::new(CrawlReport::default()),
            record_temporary_redirects,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CrawlReport> {
        self.report.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Classifies a response for `target`, found on `source`, and records
    /// it if it is an anomaly
    pub fn classify(&self, response: &Response, target: &str, source: &str) -> Verdict {
        let verdict = Verdict::of(response);

        match verdict {
            Verdict::Ok => {}
            Verdict::ClientError => {
                self.lock()
                    .client_errors
                    .entry(source.to_string())
                    .or_default()
                    .push(target.to_string());
            }
            Verdict::ServerError => {
                self.lock()
                    .server_errors
                    .entry(source.to_string())
                    .or_default()
                    .push(target.to_string());
            }
            Verdict::Redirected => {
                self.lock()
                    .redirects
                    .entry(source.to_string())
                    .or_default()
                    .push(redirect_record(response, target));
            }
            Verdict::Mixed => {
                if self.record_temporary_redirects && response.was_redirected() {
                    self.lock()
                        .temporary_redirects
                        .entry(source.to_string())
                        .or_default()
                        .push(redirect_record(response, target));
                }
            }
        }

        verdict
    }

    /// Records a link that failed in transport
    pub fn record_unreachable(&self, target: &str, source: &str, error: &FetchError) {
        self.lock()
            .unreachable
            .entry(source.to_string())
            .or_default()
            .push(UnreachableRecord {
                target: target.to_string(),
                reason: error.to_string(),
            });
    }

    /// Takes the accumulated anomalies, leaving an empty report behind
    pub fn take_report(&self) -> CrawlReport {
        std::mem::take(&mut *self.lock())
    }
}

fn redirect_record(response: &Response, target: &str) -> RedirectRecord {
    RedirectRecord {
        target: target.to_string(),
        final_url: response.final_url.clone(),
    }
}
