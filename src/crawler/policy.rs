//! Crawlability policy
//!
//! Decides whether a checked link should also be fetched in full and parsed
//! for further links: the response must come from the crawl's own site and
//! carry a content type we know how to extract links from.

use crate::crawler::fetcher::Response;
use crate::url::{site_base, SiteMatch};
use url::Url;

/// Content types the link extractor understands
const PARSEABLE_TYPES: &[&str] = &["text/html"];

/// Same-site and content-type rules for one crawl
#[derive(Debug, Clone)]
pub struct CrawlPolicy {
    base: String,
    site_match: SiteMatch,
}

impl CrawlPolicy {
    /// Builds the policy for a crawl rooted at `start_url`
    pub fn new(start_url: &Url, site_match: SiteMatch) -> Self {
        Self {
            base: site_base(start_url),
            site_match,
        }
    }

    /// The site base URLs are compared against (scheme, host and port)
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn site_match(&self) -> SiteMatch {
        self.site_match
    }

    /// Returns true if `url` is on the same site as the start URL
    pub fn is_same_site(&self, url: &str) -> bool {
        self.site_match.matches(url, &self.base)
    }

    /// Returns true if the final URL is same-site, the response is a success
    /// and its content type can be parsed for links
    ///
    /// The final URL is the one checked, so a same-site page that redirects
    /// off-site is not crawled.
    pub fn is_crawlable(&self, response: &Response) -> bool {
        (200..300).contains(&response.status)
            && self.is_same_site(&response.final_url)
            && can_parse(response.content_type())
    }
}

/// Returns true if links can be extracted from this content type
///
/// The media type is compared case-insensitively, ignoring parameters such
/// as `charset`.
pub fn can_parse(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    PARSEABLE_TYPES.contains(&media_type.as_str())
}
