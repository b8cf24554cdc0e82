//! URL handling module for SiteQA
//!
//! This module provides reference normalization (resolve + defragment),
//! start URL parsing, and same-site matching against the crawl's origin.

mod normalize;
mod site;

// Re-export main functions
pub use normalize::{normalize, parse_start_url};
pub use site::{is_same_site, site_base, SiteMatch};
