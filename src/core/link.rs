//! Syntactic link classification.

use crate::utils::path::is_external_link;

/// Syntactic classification of an `href` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind<'a> {
    /// Link with a scheme (`https://`, `mailto:`) or protocol-relative (`//host/x`).
    Absolute(&'a str),
    /// Pure fragment link (`#section`). Value is the anchor without `#`.
    Fragment(&'a str),
    /// Site-root path (`/about`, `/posts/hello?x=1`).
    SiteRoot(&'a str),
    /// File-relative path (`./image.png`, `../other`, `page`).
    FileRelative(&'a str),
}

impl<'a> LinkKind<'a> {
    /// Parse a link string into its syntactic kind.
    #[inline]
    pub fn parse(link: &'a str) -> Self {
        if is_external_link(link) || link.starts_with("//") {
            Self::Absolute(link)
        } else if let Some(anchor) = link.strip_prefix('#') {
            Self::Fragment(anchor)
        } else if link.starts_with('/') {
            Self::SiteRoot(link)
        } else {
            Self::FileRelative(link)
        }
    }

    /// Check if link is HTTP/HTTPS (or protocol-relative).
    #[inline]
    pub fn is_web(link: &str) -> bool {
        let lower = link.get(..8).unwrap_or(link).to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://") || link.starts_with("//")
    }
}
