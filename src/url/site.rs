use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

/// How a URL is compared against the crawl's site base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteMatch {
    /// The URL must start with the base and the base must end at an
    /// authority boundary (`/`, `?`, `#` or end of string), so
    /// `http://example.com.evil.com` is not part of `http://example.com`
    #[default]
    Origin,

    /// Plain string-prefix matching: anything that starts with the base
    /// counts, including hosts that merely share a prefix with it
    Prefix,
}

impl SiteMatch {
    /// Returns true if `url` belongs to the site rooted at `base`
    pub fn matches(self, url: &str, base: &str) -> bool {
        let Some(rest) = url.strip_prefix(base) else {
            return false;
        };

        match self {
            Self::Prefix => true,
            Self::Origin => matches!(rest.chars().next(), None | Some('/' | '?' | '#')),
        }
    }
}

impl fmt::Display for SiteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Origin => write!(f, "origin"),
            Self::Prefix => write!(f, "prefix"),
        }
    }
}

impl FromStr for SiteMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "origin" => Ok(Self::Origin),
            "prefix" => Ok(Self::Prefix),
            other => Err(format!(
                "unknown same-site mode '{}', expected 'origin' or 'prefix'",
                other
            )),
        }
    }
}

/// Computes the site base of a URL: scheme, host and port with path, query
/// and fragment stripped
///
/// Default ports are omitted, matching how `Url` serializes every other URL
/// the crawler compares against the base.
///
/// # Examples
///
/// ```
/// use siteqa::url::site_base;
/// use url::Url;
///
/// let url = Url::parse("http://localhost:8000/docs/index.html?x=1").unwrap();
/// assert_eq!(site_base(&url), "http://localhost:8000");
/// ```
pub fn site_base(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Returns true if `url` is on the same site as `base`
pub fn is_same_site(url: &str, base: &str, mode: SiteMatch) -> bool {
    mode.matches(url, base)
}
