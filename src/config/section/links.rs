//! `[links]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [links]
//! fallback = "/latest"                # fix for links with no known destination
//! patterns = ["webseries", "laptop"]  # case-insensitive substrings of dead paths
//! follow_redirects = true             # also report links the rule table redirects
//!
//! [[links.broken]]
//! path = "/webseries"
//! fix = "/latest"
//!
//! [[links.broken]]
//! path = "/old-offer"                 # no fix: reported as missing
//! ```

use serde::{Deserialize, Serialize};

use crate::audit::BrokenLinkMap;
use crate::config::{ConfigDiagnostics, config_fields};
use crate::core::LinkKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrokenLinkEntry {
    pub path: String,
    #[serde(default)]
    pub fix: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinksConfig {
    pub fallback: Option<String>,
    pub patterns: Vec<String>,
    pub follow_redirects: bool,
    pub broken: Vec<BrokenLinkEntry>,
}

config_fields!(LinksConfig => LinksFields, "links" { fallback, patterns, follow_redirects, broken });

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            fallback: None,
            patterns: Vec::new(),
            follow_redirects: true,
            broken: Vec::new(),
        }
    }
}

impl LinksConfig {
    pub fn broken_link_map(&self) -> BrokenLinkMap {
        BrokenLinkMap::new(
            self.broken.iter().map(|e| (e.path.clone(), e.fix.clone())),
            &self.patterns,
            self.fallback.as_deref(),
        )
    }

    /// # Checks
    /// - every broken path and fix is a site path (`/...`)
    ///
    /// Fixes that would be reported again once resolved are checked by
    /// `SiteConfig::validate`, which has the rule table at hand.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for entry in &self.broken {
            if !entry.path.starts_with('/') {
                diag.error_with_hint(
                    Self::FIELDS.broken,
                    format!("broken path '{}' must start with `/`", entry.path),
                    "list paths without origin, e.g.: path = \"/webseries\"",
                );
            }
            if let Some(fix) = &entry.fix
                && !is_site_path(fix)
            {
                diag.error(
                    Self::FIELDS.broken,
                    format!("fix '{fix}' for '{}' must start with `/`", entry.path),
                );
            }
        }

        if let Some(fallback) = &self.fallback
            && !is_site_path(fallback)
        {
            diag.error(
                Self::FIELDS.fallback,
                format!("fallback '{fallback}' must start with `/`"),
            );
        }
    }
}

fn is_site_path(s: &str) -> bool {
    matches!(LinkKind::parse(s), LinkKind::SiteRoot(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    const LINKS: &str = r#"
[links]
fallback = "/latest"
patterns = ["webseries", "temple"]

[[links.broken]]
path = "/webseries"
fix = "/latest"

[[links.broken]]
path = "/old-offer"
"#;

    #[test]
    fn test_links_config() {
        let config = test_parse_config(LINKS);
        assert!(config.links.follow_redirects);
        assert_eq!(config.links.broken.len(), 2);
        assert_eq!(config.links.broken[1].fix, None);

        let map = config.links.broken_link_map();
        assert_eq!(map.len(), 2);
        assert!(map.flags("/Temple-Guide"));

        let mut diag = ConfigDiagnostics::new();
        config.links.validate(&mut diag);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_relative_paths_rejected() {
        let config = test_parse_config(
            "[links]\nfallback = \"latest\"\n[[links.broken]]\npath = \"webseries\"\nfix = \"//cdn.example.com/x\"",
        );
        let mut diag = ConfigDiagnostics::new();
        config.links.validate(&mut diag);
        assert_eq!(diag.len(), 3);
    }
}
