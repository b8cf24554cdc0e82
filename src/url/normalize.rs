use crate::ConfigError;
use url::{ParseError, Url};

/// Schemes the crawler knows how to fetch
const FETCHABLE_SCHEMES: &[&str] = &["http", "https"];

/// Normalizes a (possibly relative) reference found on a page
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace from the raw reference
/// 2. Resolve it against `base` using standard relative-URL resolution
/// 3. Reject anything that is not an HTTP(S) URL with a host
///    (`mailto:`, `javascript:`, `tel:`, `data:` and friends)
/// 4. Split off the fragment, which is returned separately
///
/// A reference that cannot be turned into a fetchable URL yields `None`;
/// callers drop it silently.
///
/// # Arguments
///
/// * `base` - The URL of the page the reference was found on
/// * `raw_ref` - The raw `href` value
///
/// # Returns
///
/// * `Some((Url, Option<String>))` - Absolute fragment-free URL and the fragment
/// * `None` - The reference is malformed or not fetchable
///
/// # Examples
///
/// ```
/// use siteqa::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("http://example.com/docs/index.html").unwrap();
/// let (url, fragment) = normalize(&base, "guide.html#install").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/docs/guide.html");
/// assert_eq!(fragment.as_deref(), Some("install"));
/// ```
pub fn normalize(base: &Url, raw_ref: &str) -> Option<(Url, Option<String>)> {
    let mut url = base.join(raw_ref.trim()).ok()?;

    if !FETCHABLE_SCHEMES.contains(&url.scheme()) || url.host_str().is_none() {
        return None;
    }

    let fragment = url.fragment().map(str::to_string);
    url.set_fragment(None);

    Some((url, fragment))
}

/// Parses the crawl's start URL
///
/// A start URL given without a scheme (`example.com/docs`, `localhost:8000`)
/// is treated as plain HTTP. The fragment, if any, is dropped so the seed has
/// the same identity as any later reference to the same page.
///
/// # Returns
///
/// * `Ok(Url)` - Absolute HTTP(S) URL with a host
/// * `Err(ConfigError::InvalidUrl)` - The start URL cannot be crawled
pub fn parse_start_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ConfigError::InvalidUrl(
            "start URL cannot be empty".to_string(),
        ));
    }

    let mut url = match Url::parse(raw) {
        Ok(url) if looks_like_host_and_port(&url, raw) => with_default_scheme(raw)?,
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => with_default_scheme(raw)?,
        Err(e) => {
            return Err(ConfigError::InvalidUrl(format!("'{}': {}", raw, e)));
        }
    };

    if !FETCHABLE_SCHEMES.contains(&url.scheme()) {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}': only http and https URLs can be crawled",
            raw
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!("'{}': missing host", raw)));
    }

    url.set_fragment(None);
    Ok(url)
}

/// `localhost:8000` parses as scheme `localhost` with path `8000`
fn looks_like_host_and_port(url: &Url, raw: &str) -> bool {
    !FETCHABLE_SCHEMES.contains(&url.scheme())
        && !raw.contains("://")
        && raw
            .split_once(':')
            .map(|(_, rest)| rest.starts_with(|c: char| c.is_ascii_digit()))
            .unwrap_or(false)
}

fn with_default_scheme(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(&format!("http://{}", raw))
        .map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", raw, e)))
}
