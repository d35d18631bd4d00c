//! `[site]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [site]
//! url = "https://example.com"               # canonical origin
//! aliases = ["https://www.example.com"]     # also count as internal
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath, config_fields};
use crate::core::SiteOrigins;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSectionConfig {
    /// Canonical site URL. Only its origin is used.
    pub url: Option<String>,

    /// Other origins serving the same site.
    pub aliases: Vec<String>,
}

config_fields!(SiteSectionConfig => SiteFields, "site" { url, aliases });

impl SiteSectionConfig {
    /// Canonical origin plus aliases, or `None` when `url` is unset or
    /// anything fails to parse.
    pub fn origins(&self) -> Option<SiteOrigins> {
        SiteOrigins::new(self.url.as_deref()?, &self.aliases).ok()
    }

    /// # Checks
    /// - `url` is set, parses, and uses http or https
    /// - every alias parses the same way
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        match &self.url {
            Some(url) => check_url(url, Self::FIELDS.url, diag),
            None => diag.error_with_hint(
                Self::FIELDS.url,
                "site url is not configured",
                format!("set {}, e.g.: \"https://example.com\"", Self::FIELDS.url),
            ),
        }
        for alias in &self.aliases {
            check_url(alias, Self::FIELDS.aliases, diag);
        }
    }
}

fn check_url(raw: &str, field: FieldPath, diag: &mut ConfigDiagnostics) {
    match url::Url::parse(raw) {
        Ok(parsed) => {
            if !matches!(parsed.scheme(), "http" | "https") {
                diag.error_with_hint(
                    field,
                    format!(
                        "scheme '{}' not supported in '{raw}', must be http or https",
                        parsed.scheme()
                    ),
                    "use format like https://example.com",
                );
            } else if parsed.host_str().is_none_or(str::is_empty) {
                diag.error_with_hint(
                    field,
                    format!("'{raw}' has no host"),
                    "use format like https://example.com",
                );
            }
        }
        Err(e) => diag.error_with_hint(
            field,
            format!("invalid URL '{raw}': {e}"),
            "use format like https://example.com",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_site_origins() {
        let config = test_parse_config(r#"aliases = ["https://www.example.com"]"#);
        let origins = config.site.origins().unwrap();
        assert_eq!(origins.canonical(), "https://example.com");
        assert_eq!(origins.all().len(), 2);
    }

    #[test]
    fn test_site_validate() {
        let mut diag = ConfigDiagnostics::new();
        SiteSectionConfig {
            url: Some("https://example.com/".into()),
            aliases: vec!["http://www.example.com".into()],
        }
        .validate(&mut diag);
        assert!(diag.is_empty());

        let mut diag = ConfigDiagnostics::new();
        SiteSectionConfig {
            url: Some("ftp://example.com".into()),
            aliases: vec!["not a url".into()],
        }
        .validate(&mut diag);
        assert_eq!(diag.len(), 2);

        let mut diag = ConfigDiagnostics::new();
        SiteSectionConfig::default().validate(&mut diag);
        assert_eq!(diag.errors()[0].field, SiteSectionConfig::FIELDS.url);
    }
}
