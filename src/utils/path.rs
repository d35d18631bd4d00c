//! Path and link helpers.
//!
//! - `normalize_path` - filesystem paths (canonicalize + fallback)
//! - `is_external_link` - link has a URL scheme (`https:`, `mailto:`, ...)
//! - `strip_query_fragment` - drop `?query` and `#fragment` from a link

use std::path::{Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first, then falls back to joining relative paths
/// with the current directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Check if a link carries a URL scheme.
///
/// A scheme is at least one character of ASCII alphanumerics, `+`, `-` or
/// `.` followed by `:`.
#[inline]
pub fn is_external_link(link: &str) -> bool {
    link.find(':').is_some_and(|pos| {
        pos > 0
            && link[..pos]
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

/// Drop the query string and fragment.
///
/// `/posts/a?x=1#top` -> `/posts/a`
#[inline]
pub fn strip_query_fragment(link: &str) -> &str {
    link.split(['?', '#']).next().unwrap_or(link)
}
