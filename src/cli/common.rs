//! Components shared across CLI commands and the HTTP service.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::audit::{BrokenLinkMap, LinkAuditor};
use crate::config::SiteConfig;
use crate::core::{LinkKind, UrlPath};
use crate::resolve::CanonicalResolver;
use crate::store::{ContentDocument, ContentStore};

/// Everything a command needs, built once from the config.
pub struct App {
    pub config: Arc<SiteConfig>,
    pub resolver: CanonicalResolver,
    pub links: BrokenLinkMap,
    pub store: Box<dyn ContentStore>,
}

impl App {
    /// Build from config with the content directory store.
    pub fn new(config: Arc<SiteConfig>) -> Result<Self> {
        let store = Box::new(config.store());
        Self::with_store(config, store)
    }

    pub fn with_store(config: Arc<SiteConfig>, store: Box<dyn ContentStore>) -> Result<Self> {
        let resolver = config.resolver().context("failed to build redirect rules")?;
        let links = config.broken_link_map();
        Ok(Self {
            config,
            resolver,
            links,
            store,
        })
    }

    pub fn auditor(&self) -> LinkAuditor<'_> {
        LinkAuditor::new(&self.resolver, &self.links)
            .follow_redirects(self.config.links.follow_redirects)
    }

    /// All published documents.
    pub fn corpus(&self) -> Result<Vec<ContentDocument>> {
        self.store
            .list_published()
            .context("failed to load content documents")
    }

    /// Site path for user input that may be a path or a URL on the site.
    ///
    /// `None` for URLs on foreign hosts or with non-web schemes.
    pub fn site_path(&self, input: &str) -> Option<String> {
        let input = input.trim();
        match LinkKind::parse(input) {
            LinkKind::Absolute(url) => {
                let path = self.resolver.origins().internal_path(url)?;
                Some(UrlPath::from_browser(&path).to_string())
            }
            _ => Some(UrlPath::from_browser(input).to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use crate::store::memory::MemoryStore;

    pub(crate) const CONFIG: &str = r#"
aliases = ["https://www.example.com"]

[[redirects]]
source = "/diwali2020"
destination = "/latest"

[[redirects]]
source = "/old-latest"
destination = "/diwali2020"
permanent = false

[links]
fallback = "/latest"
patterns = ["temple"]

[[links.broken]]
path = "/webseries"
fix = "/latest"

[canonical]
samples = ["/latest", "/diwali2020"]
"#;

    pub(crate) fn app(docs: Vec<ContentDocument>) -> App {
        let config = Arc::new(test_parse_config(CONFIG));
        App::with_store(config, Box::new(MemoryStore::new(docs))).unwrap()
    }

    #[test]
    fn test_site_path() {
        let app = app(Vec::new());
        let path = |s: &str| app.site_path(s);
        assert_eq!(path("https://www.example.com/diwali2020/?x=1").as_deref(), Some("/diwali2020"));
        assert_eq!(path("/caf%C3%A9/").as_deref(), Some("/café"));
        assert_eq!(path("about").as_deref(), Some("/about"));
        assert_eq!(path("https://other.org/x"), None);
        assert_eq!(path("mailto:me@example.com"), None);
    }

    #[test]
    fn test_auditor_uses_config() {
        let app = app(vec![ContentDocument::new(
            "a",
            "A",
            r#"<a href="/old-latest">x</a> <a href="/webseries">y</a>"#,
        )]);
        let corpus = app.corpus().unwrap();
        let findings = app.auditor().scan(&corpus);
        assert_eq!(findings.len(), 2);
        assert!(findings.iter().all(|f| f.suggested_fix.as_deref() == Some("/latest")));
    }
}
