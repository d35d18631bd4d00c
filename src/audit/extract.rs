//! Anchor extraction from raw markup.
//!
//! A tolerant regex scan, not an HTML parser: anything that does not look
//! like `<a ... href="...">text</a>` is skipped.

use std::sync::LazyLock;

use regex::Regex;

use crate::core::{LinkKind, SiteOrigins, UrlPath};
use crate::utils::html::{inner_text, unescape};

/// `<a` + attributes + quoted `href` + rest of tag + inner markup + `</a>`.
///
/// Quoted values may not contain `<` or `>`, so an unterminated quote cannot
/// swallow the following anchors.
static ANCHOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?is)<a\s(?:[^>]*?\s)?href\s*=\s*(?:"([^"<>]*)"|'([^'<>]*)')[^>]*>(.*?)</a\s*>"#,
    )
    .unwrap()
});

/// An internal link found in a document body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// `href` value exactly as written in the markup.
    pub url: String,
    /// Normalized site path (no origin, query or fragment).
    pub path: UrlPath,
    /// Visible anchor text.
    pub link_text: String,
}

/// Extract internal links from `body`.
///
/// Site-root paths are internal. Absolute and protocol-relative links are
/// internal only when they point at one of `origins`. Everything else
/// (foreign hosts, `mailto:`, fragments, file-relative links) is ignored.
pub fn extract_links(body: &str, origins: &SiteOrigins) -> Vec<ExtractedLink> {
    ANCHOR
        .captures_iter(body)
        .filter_map(|caps| {
            let raw = caps.get(1).or_else(|| caps.get(2))?.as_str();
            let path = internal_path(raw, origins)?;
            let link_text = caps.get(3).map_or_else(String::new, |m| inner_text(m.as_str()));
            Some(ExtractedLink {
                url: raw.to_string(),
                path,
                link_text,
            })
        })
        .collect()
}

fn internal_path(raw: &str, origins: &SiteOrigins) -> Option<UrlPath> {
    let href = unescape(raw.trim());
    match LinkKind::parse(&href) {
        LinkKind::SiteRoot(path) => Some(UrlPath::from_browser(path)),
        LinkKind::Absolute(url) if LinkKind::is_web(url) => origins
            .internal_path(url)
            .map(|path| UrlPath::from_browser(&path)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origins() -> SiteOrigins {
        SiteOrigins::new(
            "https://example.com",
            &["https://www.example.com".to_string()],
        )
        .unwrap()
    }

    fn extract(body: &str) -> Vec<ExtractedLink> {
        extract_links(body, &origins())
    }

    #[test]
    fn test_double_quoted_site_root() {
        let links = extract(r#"<p>See <a href="/webseries">the list</a>.</p>"#);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "/webseries");
        assert_eq!(links[0].path, "/webseries");
        assert_eq!(links[0].link_text, "the list");
    }

    #[test]
    fn test_single_quoted() {
        let links = extract("<a href='/temple-guide'>t</a>");
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "/temple-guide");
        assert_eq!(links[0].link_text, "t");
    }

    #[test]
    fn test_external_ignored() {
        assert!(extract(r#"<a href="https://other.com/x">ext</a>"#).is_empty());
        assert!(extract(r#"<a href="mailto:me@example.com">mail</a>"#).is_empty());
        assert!(extract("<a href=\"#top\">top</a>").is_empty());
        assert!(extract("<a href=\"relative/page\">rel</a>").is_empty());
    }

    #[test]
    fn test_own_absolute_normalized() {
        let links = extract(
            r#"<a href="https://www.example.com/laptop-deals/?ref=nav#top">Deals</a>"#,
        );
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://www.example.com/laptop-deals/?ref=nav#top");
        assert_eq!(links[0].path, "/laptop-deals");
    }

    #[test]
    fn test_attributes_and_nested_markup() {
        let body = r#"<A class="btn" HREF = "/x" target="_blank"><span>Go</span>
            <em>now</em></A>"#;
        let links = extract(body);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].path, "/x");
        assert_eq!(links[0].link_text, "Go now");
    }

    #[test]
    fn test_data_href_is_not_href() {
        assert!(extract(r#"<a data-href="/x">x</a>"#).is_empty());
    }

    #[test]
    fn test_encoded_href() {
        let links = extract(r#"<a href="/search?a=1&amp;b=2">s</a><a href="/caf%C3%A9">c</a>"#);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "/search?a=1&amp;b=2");
        assert_eq!(links[0].path, "/search");
        assert_eq!(links[1].path, "/café");
    }

    #[test]
    fn test_malformed_markup_is_skipped() {
        let body = r#"<a href="/unterminated>oops</a> <a href=/bare>bare</a> <a>no href</a>
            <a href="/ok">ok</a>"#;
        let links = extract(body);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].path, "/ok");
    }

    #[test]
    fn test_multiple_occurrences() {
        let body = r#"<a href="/webseries">x</a> and again <a href="/webseries">x</a>"#;
        assert_eq!(extract(body).len(), 2);
    }
}
