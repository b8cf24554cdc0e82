//! HTML parser for extracting hyperlink references
//!
//! Only `href` attributes are collected. Images, scripts and other `src`
//! references are not checked.

use scraper::{Html, Selector};

/// Links found on one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    /// Raw `href` of the first `<base>` element, if any
    pub base: Option<String>,

    /// Raw `href` values in document order
    pub hrefs: Vec<String>,
}

/// Extracts the document base and every raw `href` value from an HTML
/// document
///
/// # Extraction Rules
///
/// **Include:**
/// - Any element carrying an `href` attribute (`<a>`, `<area>`, `<link>`)
///
/// **Exclude:**
/// - `<a href="..." download>` (a file to save, not a page to visit)
/// - `<base href="...">` (returned as `base` instead; only the first counts)
/// - Empty or whitespace-only values
///
/// Values are returned untouched (not trimmed, not resolved) in document
/// order; resolution and scheme filtering happen in the normalizer.
///
/// # Example
///
/// ```
/// use siteqa::crawler::extract_links;
///
/// let html = r#"<head><base href="/docs/"></head><body><a href="guide">Guide</a></body>"#;
/// let links = extract_links(html);
/// assert_eq!(links.base.as_deref(), Some("/docs/"));
/// assert_eq!(links.hrefs, vec!["guide"]);
/// ```
pub fn extract_links(html: &str) -> PageLinks {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse("[href]") else {
        return PageLinks::default();
    };

    let mut links = PageLinks::default();
    for element in document.select(&selector) {
        let element = element.value();
        let Some(href) = element.attr("href").filter(|href| !href.trim().is_empty()) else {
            continue;
        };

        if element.name() == "base" {
            if links.base.is_none() {
                links.base = Some(href.to_string());
            }
        } else if element.attr("download").is_none() {
            links.hrefs.push(href.to_string());
        }
    }

    links
}

/// Extracts every raw `href` value, ignoring the document base
///
/// # Example
///
/// ```
/// use siteqa::crawler::extract_hrefs;
///
/// let html = r##"<html><body><a href="/page">Link</a><a href="#top">Top</a></body></html>"##;
/// assert_eq!(extract_hrefs(html), vec!["/page", "#top"]);
/// ```
pub fn extract_hrefs(html: &str) -> Vec<String> {
    extract_links(html).hrefs
}
