//! Canonical URL resolution.
//!
//! Follows a path through the redirect rule table until it reaches a fixed
//! point (no rule matches) or the hop ceiling. Hitting the ceiling without
//! settling is a rule-table bug and is returned as [`ResolveError::HopLimit`],
//! never as a best-effort URL.

mod check;

pub use check::{CanonicalCheck, CheckReport, CheckSummary};

use rustc_hash::FxHashSet;
use serde::Serialize;
use thiserror::Error;

use crate::core::{LinkKind, SiteOrigins, UrlPath};
use crate::rules::RuleTable;

/// Maximum number of rule applications for a single path.
pub const MAX_HOPS: usize = 10;

/// Result of resolving a path to its final destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCanonical {
    /// Input as given.
    pub original_path: String,
    /// Normalized site path, or an absolute URL when a rule sends the path
    /// to a foreign host.
    pub final_path: String,
    /// Number of rules applied. Always `<= MAX_HOPS`.
    pub hops: usize,
    /// Every applied rule was permanent (true at zero hops).
    pub permanent: bool,
}

impl ResolvedCanonical {
    /// The path left the site through an absolute redirect.
    pub fn is_external(&self) -> bool {
        !self.final_path.starts_with('/')
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("redirect chain from `{path}` did not settle after {hops} hops ({})", .chain.join(" -> "))]
    HopLimit {
        path: String,
        hops: usize,
        /// Every path visited, starting with the normalized input.
        chain: Vec<String>,
    },
}

/// Where a rule destination points.
enum Target {
    Site(UrlPath),
    External(String),
}

/// Resolves paths through a rule table to canonical URLs.
#[derive(Debug, Clone)]
pub struct CanonicalResolver {
    table: RuleTable,
    origins: SiteOrigins,
}

impl CanonicalResolver {
    pub fn new(table: RuleTable, origins: SiteOrigins) -> Self {
        Self { table, origins }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn origins(&self) -> &SiteOrigins {
        &self.origins
    }

    /// Follow the redirect chain starting at `path`.
    pub fn resolve(&self, path: &str) -> Result<ResolvedCanonical, ResolveError> {
        let mut current = UrlPath::new(path);
        let mut chain = vec![current.to_string()];
        let mut hops = 0;
        let mut permanent = true;

        loop {
            let Some(hit) = self.table.first_match(current.as_str()) else {
                return Ok(ResolvedCanonical {
                    original_path: path.to_string(),
                    final_path: current.to_string(),
                    hops,
                    permanent,
                });
            };

            if hops == MAX_HOPS {
                return Err(ResolveError::HopLimit {
                    path: path.to_string(),
                    hops,
                    chain,
                });
            }

            hops += 1;
            permanent &= hit.rule.permanent;

            match self.target(&hit.destination) {
                Target::Site(next) => current = next,
                Target::External(url) => {
                    return Ok(ResolvedCanonical {
                        original_path: path.to_string(),
                        final_path: url,
                        hops,
                        permanent,
                    });
                }
            }
            chain.push(current.to_string());
        }
    }

    /// Whether any rule matches `path`, without following the chain.
    pub fn would_redirect(&self, path: &str) -> bool {
        self.table.matches_any(UrlPath::new(path).as_str())
    }

    /// Absolute canonical URL for `path`.
    ///
    /// `base_url` defaults to the canonical site origin.
    pub fn generate_canonical_url(
        &self,
        path: &str,
        base_url: Option<&str>,
    ) -> Result<String, ResolveError> {
        let resolved = self.resolve(path)?;
        Ok(self.absolute(&resolved, base_url))
    }

    /// Absolute URL of an already resolved path.
    pub fn absolute(&self, resolved: &ResolvedCanonical, base_url: Option<&str>) -> String {
        if resolved.is_external() {
            return resolved.final_path.clone();
        }
        let base = base_url
            .unwrap_or_else(|| self.origins.canonical())
            .trim_end_matches('/');
        let path = UrlPath::new(&resolved.final_path);
        format!("{base}{}", path.to_encoded())
    }

    /// Sources whose redirect chain hits the hop limit.
    ///
    /// Resolves one sample path per rule (wildcards and parameter tokens
    /// filled in) and the site destination that sample is sent to, so cycles
    /// between parameter or wildcard rules are found as well as exact ones.
    pub fn check_rule_table(&self) -> Vec<ResolveError> {
        let mut seen = FxHashSet::default();
        let mut errors = Vec::new();

        for (source, destination) in self.table.samples() {
            let mut candidates = vec![source];
            if matches!(LinkKind::parse(&destination), LinkKind::SiteRoot(_)) {
                candidates.push(destination);
            }

            for candidate in candidates {
                if !seen.insert(UrlPath::new(&candidate)) {
                    continue;
                }
                if let Err(e) = self.resolve(&candidate) {
                    errors.push(e);
                }
            }
        }

        errors
    }

    fn target(&self, destination: &str) -> Target {
        match LinkKind::parse(destination) {
            LinkKind::Absolute(url) => match self.origins.internal_path(url) {
                Some(path) => Target::Site(UrlPath::from_browser(&path)),
                None => Target::External(url.to_string()),
            },
            _ => Target::Site(UrlPath::new(destination)),
        }
    }
}
