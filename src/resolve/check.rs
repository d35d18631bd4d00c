//! Canonical URL validation.

use serde::Serialize;
use url::Url;

use super::{CanonicalResolver, ResolveError};
use crate::core::{LinkKind, UrlPath};

/// Verdict for one candidate canonical URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalCheck {
    pub url: String,
    pub is_valid: bool,
    /// The correct canonical URL, when `url` is not already it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub should_be: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
}

impl CanonicalCheck {
    fn valid(url: &str) -> Self {
        Self {
            url: url.to_string(),
            is_valid: true,
            should_be: None,
            issue: None,
        }
    }

    fn invalid(url: &str, should_be: Option<String>, issue: impl Into<String>) -> Self {
        Self {
            url: url.to_string(),
            is_valid: false,
            should_be,
            issue: Some(issue.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub total: usize,
    pub valid: usize,
    pub invalid: usize,
}

/// A batch of checks with counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub results: Vec<CanonicalCheck>,
    pub summary: CheckSummary,
}

impl CheckReport {
    pub fn new(results: Vec<CanonicalCheck>) -> Self {
        let valid = results.iter().filter(|c| c.is_valid).count();
        let summary = CheckSummary {
            total: results.len(),
            valid,
            invalid: results.len() - valid,
        };
        Self { results, summary }
    }
}

/// The raw path of a candidate plus whether its origin is acceptable.
struct Candidate<'a> {
    raw_path: std::borrow::Cow<'a, str>,
    has_query: bool,
    canonical_origin: bool,
}

impl CanonicalResolver {
    /// Check that `url` is already its own canonical URL.
    ///
    /// Relative inputs (`/latest`) are judged on their path only; absolute
    /// inputs must also sit on the canonical origin.
    pub fn validate_canonical_url(&self, url: &str) -> CanonicalCheck {
        let candidate = match self.candidate(url) {
            Ok(c) => c,
            Err(issue) => return CanonicalCheck::invalid(url, None, issue),
        };

        let path = UrlPath::from_browser(&candidate.raw_path);
        let resolved = match self.resolve(path.as_str()) {
            Ok(r) => r,
            Err(e @ ResolveError::HopLimit { .. }) => {
                return CanonicalCheck::invalid(url, None, format!("redirect loop: {e}"));
            }
        };
        let should_be = self.absolute(&resolved, None);

        let issue = if resolved.hops > 0 {
            Some(format!("redirects to {}", resolved.final_path))
        } else if !candidate.canonical_origin {
            Some(format!(
                "not on canonical origin {}",
                self.origins().canonical()
            ))
        } else if candidate.has_query {
            Some("query string or fragment in canonical URL".to_string())
        } else if !path.is_root() && candidate.raw_path.ends_with('/') {
            Some("trailing slash".to_string())
        } else {
            None
        };

        match issue {
            Some(issue) => CanonicalCheck::invalid(url, Some(should_be), issue),
            None => CanonicalCheck::valid(url),
        }
    }

    /// Validate a batch of URLs, preserving input order.
    pub fn validate_canonical_urls<S: AsRef<str>>(&self, urls: &[S]) -> Vec<CanonicalCheck> {
        urls.iter()
            .map(|u| self.validate_canonical_url(u.as_ref()))
            .collect()
    }

    fn candidate<'a>(&self, url: &'a str) -> Result<Candidate<'a>, String> {
        let url = url.trim();
        match LinkKind::parse(url) {
            LinkKind::Absolute(abs) if LinkKind::is_web(abs) => {
                let parsed = if abs.starts_with("//") {
                    Url::parse(&format!("https:{abs}"))
                } else {
                    Url::parse(abs)
                }
                .map_err(|e| format!("not a valid URL: {e}"))?;

                Ok(Candidate {
                    raw_path: parsed.path().to_string().into(),
                    has_query: parsed.query().is_some() || parsed.fragment().is_some(),
                    canonical_origin: self.origins().is_canonical(&parsed),
                })
            }
            LinkKind::SiteRoot(path) => Ok(Candidate {
                raw_path: crate::utils::path::strip_query_fragment(path).into(),
                has_query: path.contains(['?', '#']),
                canonical_origin: true,
            }),
            _ => Err("not an http(s) URL or site path".to_string()),
        }
    }
}
