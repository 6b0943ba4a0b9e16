//! Utility functions and helpers.

pub mod http;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// Returns `None` when `href` cannot be turned into an absolute URL.
pub fn resolve_url(base: &Url, href: &str) -> Option<String> {
    base.join(href).map(|u| u.to_string()).ok()
}

/// Collapse runs of whitespace and trim the ends.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
