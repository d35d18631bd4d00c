//! Known-broken path table and heuristics.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::core::UrlPath;

/// Why an internal link was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// Target no longer exists; the fix is a fallback page.
    Missing,
    /// Target moved to a known destination.
    Redirected,
}

impl Classification {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Redirected => "redirected",
        }
    }
}

/// What the map says about a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<'a> {
    /// Listed with a destination.
    Moved(&'a UrlPath),
    /// Listed without a destination, or flagged by a heuristic pattern.
    Gone,
}

/// Fixed table of known-broken paths plus substring heuristics.
#[derive(Debug, Clone, Default)]
pub struct BrokenLinkMap {
    entries: FxHashMap<UrlPath, Option<UrlPath>>,
    /// Lowercased substrings.
    patterns: Vec<String>,
    fallback: Option<UrlPath>,
}

impl BrokenLinkMap {
    pub fn new<I, S>(entries: I, patterns: &[S], fallback: Option<&str>) -> Self
    where
        I: IntoIterator<Item = (String, Option<String>)>,
        S: AsRef<str>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(path, fix)| (UrlPath::new(&path), fix.as_deref().map(UrlPath::new)))
                .collect(),
            patterns: patterns
                .iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            fallback: fallback.map(UrlPath::new),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.patterns.is_empty()
    }

    pub fn fallback(&self) -> Option<&UrlPath> {
        self.fallback.as_ref()
    }

    /// Heuristic pattern hit (case-insensitive substring).
    pub fn flags(&self, path: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let lower = path.to_lowercase();
        self.patterns.iter().any(|p| lower.contains(p.as_str()))
    }

    /// Look up a normalized path. `None` means the map has nothing to say.
    pub fn lookup(&self, path: &UrlPath) -> Option<Verdict<'_>> {
        match self.entries.get(path) {
            Some(Some(fix)) => Some(Verdict::Moved(fix)),
            Some(None) => Some(Verdict::Gone),
            None if self.flags(path.as_str()) => Some(Verdict::Gone),
            None => None,
        }
    }

    /// Every configured destination, in no particular order.
    pub fn fixes(&self) -> impl Iterator<Item = &UrlPath> {
        self.entries.values().flatten()
    }
}
