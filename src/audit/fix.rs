//! Body rewriting and persistence of fixes.

use std::borrow::Cow;

use regex::Captures;
use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::core::{LinkKind, SiteOrigins};
use crate::log;
use crate::store::ContentStore;
use crate::utils::html::escape;
use crate::utils::pattern::href_attr;

/// Result of fixing one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixOutcome {
    pub document_id: String,
    pub changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Rewritten href values.
    #[serde(skip)]
    pub fixed_links: Vec<FixedLink>,
}

/// One href value rewritten in one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedLink {
    pub document_id: String,
    pub title: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixSummary {
    pub blogs_updated: usize,
    pub errors: usize,
    pub total_processed: usize,
}

/// Outcome of writing fixes back to the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FixReport {
    pub success: bool,
    pub summary: FixSummary,
    pub fixed_links: Vec<FixedLink>,
    pub errors: Vec<String>,
}

/// Rewrite every `href` in `body` that points at `target` to `suggested`.
///
/// Bare paths are also matched behind each site origin. Returns the href
/// values that were actually replaced.
pub(super) fn rewrite<'a>(
    body: &'a str,
    target: &str,
    suggested: &str,
    origins: &SiteOrigins,
) -> (Cow<'a, str>, Vec<String>) {
    let mut variants = vec![target.to_string()];
    if matches!(LinkKind::parse(target), LinkKind::SiteRoot(_)) {
        variants.extend(origins.all().iter().map(|o| format!("{o}{target}")));
    }

    let value = escape(suggested);
    let mut body = Cow::Borrowed(body);
    let mut replaced = Vec::new();

    for variant in variants {
        let Ok(re) = href_attr(&variant) else {
            log!("fix"; "skipping unbuildable pattern for `{}`", variant);
            continue;
        };
        let next = match re.replace_all(&body, |caps: &Captures| {
            format!("{}href=\"{value}\"", &caps[1])
        }) {
            Cow::Owned(next) => next,
            Cow::Borrowed(_) => continue,
        };
        body = Cow::Owned(next);
        replaced.push(variant);
    }

    (body, replaced)
}

/// Pairs of (target, suggested) with duplicates and no-op fixes removed.
pub(super) fn unique_fixes<'a, I>(pairs: I) -> Vec<(&'a str, &'a str)>
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    let mut seen = FxHashSet::default();
    pairs
        .into_iter()
        .filter_map(|(target, fix)| Some((target, fix?)))
        .filter(|(target, fix)| target != fix)
        .filter(|pair| seen.insert(*pair))
        .collect()
}

/// Write changed documents through `store`.
///
/// A failed write is recorded on its outcome and in the report; the
/// remaining documents are still written.
pub fn persist(store: &dyn ContentStore, outcomes: &mut [FixOutcome]) -> FixReport {
    let mut report = FixReport {
        summary: FixSummary {
            total_processed: outcomes.len(),
            ..FixSummary::default()
        },
        ..FixReport::default()
    };

    for outcome in outcomes.iter_mut() {
        let Some(body) = outcome.new_body.as_deref().filter(|_| outcome.changed) else {
            continue;
        };
        match store.update_body(&outcome.document_id, body) {
            Ok(()) => {
                report.summary.blogs_updated += 1;
                report.fixed_links.extend(outcome.fixed_links.iter().cloned());
            }
            Err(e) => {
                let message = format!("{}: {e}", outcome.document_id);
                log!("fix"; "failed to update {}", message);
                outcome.error = Some(e.to_string());
                report.errors.push(message);
            }
        }
    }

    report.summary.errors = report.errors.len();
    report.success = report.errors.is_empty();
    report
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

    #[test]
    fn test_rewrite_all_quote_styles() {
        let body = r#"<a href="/webseries">a</a> <a HREF = '/webseries'>b</a>"#;
        let (out, replaced) = rewrite(body, "/webseries", "/latest", &origins());
        assert_eq!(out, r#"<a href="/latest">a</a> <a href="/latest">b</a>"#);
        assert_eq!(replaced, vec!["/webseries"]);
    }

    #[test]
    fn test_rewrite_origin_variants() {
        let body = r#"<a href="https://www.example.com/webseries">a</a> <a href="https://example.com/webseries">b</a>"#;
        let (out, replaced) = rewrite(body, "/webseries", "/latest", &origins());
        assert!(!out.contains("webseries"));
        assert_eq!(replaced.len(), 2);
    }

    #[test]
    fn test_rewrite_is_literal() {
        // `.` must not match any character, `$` must not expand.
        let body = r#"<a href="/a.b">x</a> <a href="/axb">y</a>"#;
        let (out, _) = rewrite(body, "/a.b", "/$1&", &origins());
        assert_eq!(out, r#"<a href="/$1&amp;">x</a> <a href="/axb">y</a>"#);
    }

    #[test]
    fn test_rewrite_leaves_prefix_matches() {
        let body = r#"<a href="/webseries-2">x</a>"#;
        let (out, replaced) = rewrite(body, "/webseries", "/latest", &origins());
        assert!(matches!(out, Cow::Borrowed(_)));
        assert!(replaced.is_empty());
    }

    #[test]
    fn test_rewrite_keeps_other_href_attributes() {
        let body = "<a class=\"x\"\nhref='/webseries' data-href=\"/webseries\">a</a>";
        let (out, replaced) = rewrite(body, "/webseries", "/latest", &origins());
        assert_eq!(out, "<a class=\"x\"\nhref=\"/latest\" data-href=\"/webseries\">a</a>");
        assert_eq!(replaced, vec!["/webseries"]);

        let body = r#"<svg><use xlink:href="/webseries"/></svg>"#;
        let (out, replaced) = rewrite(body, "/webseries", "/latest", &origins());
        assert!(matches!(out, Cow::Borrowed(_)));
        assert!(replaced.is_empty());
    }

    #[test]
    fn test_unique_fixes() {
        let pairs = [
            ("/a", Some("/b")),
            ("/a", Some("/b")),
            ("/c", None),
            ("/d", Some("/d")),
        ];
        assert_eq!(unique_fixes(pairs), vec![("/a", "/b")]);
    }
}
