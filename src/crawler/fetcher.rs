//! HTTP fetcher implementation
//!
//! This module defines the response value the crawl engine reasons about and
//! the transport seam it fetches through:
//! - `Response`: status, final URL, redirect history and headers
//! - `Transport`: HEAD (existence check) and GET (full fetch)
//! - `HttpTransport`: the reqwest-backed transport, following redirects
//!   manually so the full redirect history is observable

use crate::config::CrawlConfig;
use crate::{FetchError, FetchResult};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{redirect::Policy, Client, Method};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::time::Duration;
use url::Url;

/// One hop of a redirect chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectHop {
    /// Status code of the redirect response (301, 302, ...)
    pub status: u16,

    /// URL that answered with the redirect
    pub url: String,
}

/// Result of a request, after following redirects
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code of the final response
    pub status: u16,

    /// URL of the final response
    pub final_url: String,

    /// Redirect hops taken to reach `final_url`, in order
    pub history: Vec<RedirectHop>,

    /// Response headers with lowercase names
    pub headers: HashMap<String, String>,
}

impl Response {
    /// Creates a response that was not redirected and carries no headers
    pub fn new(status: u16, final_url: impl Into<String>) -> Self {
        Self {
            status,
            final_url: final_url.into(),
            history: Vec::new(),
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_redirect(mut self, status: u16, url: impl Into<String>) -> Self {
        self.history.push(RedirectHop {
            status,
            url: url.into(),
        });
        self
    }

    /// Looks up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// The Content-Type header, or an empty string when absent
    pub fn content_type(&self) -> &str {
        self.header("content-type").unwrap_or("")
    }

    pub fn was_redirected(&self) -> bool {
        !self.history.is_empty()
    }
}

/// A fully fetched document
#[derive(Debug, Clone)]
pub struct Document {
    pub response: Response,
    pub body: String,
}

/// The transport the crawl engine fetches through
///
/// Connection pooling, TLS and redirect following are the transport's
/// business. Implementations are shared read-only across all workers.
pub trait Transport: Send + Sync {
    /// Lightweight existence check
    fn head(&self, url: &str) -> impl Future<Output = FetchResult<Response>> + Send;

    /// Full fetch of a document
    fn get(&self, url: &str) -> impl Future<Output = FetchResult<Document>> + Send;
}

/// Builds an HTTP client with proper configuration
///
/// Redirects are never followed by the client itself; `HttpTransport`
/// follows them so it can record every hop.
pub fn build_http_client(config: &CrawlConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(config.timeout)
        .connect_timeout(config.timeout.min(Duration::from_secs(10)))
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    max_redirects: usize,
}

impl HttpTransport {
    /// Creates a transport from a crawl configuration
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::with_client(build_http_client(config)?, config.max_redirects))
    }

    /// Wraps an existing client; the client must not follow redirects itself
    pub fn with_client(client: Client, max_redirects: usize) -> Self {
        Self {
            client,
            max_redirects,
        }
    }

    /// Sends a request, following redirects by hand
    ///
    /// # Request Flow
    ///
    /// 1. Send the request to the current URL
    /// 2. If the status is not 3xx, or there is no Location header, stop
    /// 3. Record the hop, resolve Location against the current URL, repeat
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | More than `max_redirects` hops | `RedirectLimit` |
    /// | A URL visited twice in one chain | `RedirectLoop` |
    /// | Unresolvable Location | `InvalidRedirect` |
    async fn send(
        &self,
        method: Method,
        url: &str,
    ) -> Result<(reqwest::Response, Vec<RedirectHop>), FetchError> {
        let mut current = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        let mut history = Vec::new();
        let mut visited = HashSet::from([current.to_string()]);

        loop {
            let response = self
                .client
                .request(method.clone(), current.clone())
                .send()
                .await
                .map_err(|e| classify_error(current.as_str(), e))?;

            let status = response.status();
            if !status.is_redirection() {
                return Ok((response, history));
            }

            let Some(location) = location_header(response.headers()) else {
                return Ok((response, history));
            };

            let next = current
                .join(&location)
                .map_err(|_| FetchError::InvalidRedirect {
                    url: current.to_string(),
                    location: location.clone(),
                })?;

            history.push(RedirectHop {
                status: status.as_u16(),
                url: current.to_string(),
            });

            if history.len() > self.max_redirects {
                return Err(FetchError::RedirectLimit {
                    url: url.to_string(),
                });
            }

            if !visited.insert(next.to_string()) {
                return Err(FetchError::RedirectLoop {
                    url: next.to_string(),
                });
            }

            tracing::trace!("{} {} redirected to {}", status.as_u16(), current, next);
            current = next;
        }
    }
}

impl Transport for HttpTransport {
    async fn head(&self, url: &str) -> FetchResult<Response> {
        let (response, history) = self.send(Method::HEAD, url).await?;
        Ok(to_response(&response, history))
    }

    async fn get(&self, url: &str) -> FetchResult<Document> {
        let (response, history) = self.send(Method::GET, url).await?;
        let converted = to_response(&response, history);

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })?;

        Ok(Document {
            response: converted,
            body,
        })
    }
}

fn location_header(headers: &HeaderMap) -> Option<String> {
    headers
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn to_response(response: &reqwest::Response, history: Vec<RedirectHop>) -> Response {
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();

    Response {
        status: response.status().as_u16(),
        final_url: response.url().to_string(),
        history,
        headers,
    }
}

/// Classifies a reqwest error into a transport fault
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Connect {
            url: url.to_string(),
        }
    } else {
        FetchError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
