//! Configuration management for `relink.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── canonical  # [canonical]
//! │   ├── content    # [content]
//! │   ├── links      # [links]
//! │   ├── serve      # [serve]
//! │   └── site       # [site]
//! ├── types/         # Utility types
//! │   ├── error      # ConfigError, ConfigDiagnostics
//! │   ├── field      # FieldPath
//! │   └── handle     # Global config handle
//! └── mod.rs         # SiteConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section          | Purpose                                        |
//! |------------------|------------------------------------------------|
//! | `[site]`         | Canonical origin and alias domains             |
//! | `[content]`      | Content directory scanned by `scan`/`fix`      |
//! | `[[redirects]]`  | Ordered redirect rules (first match wins)      |
//! | `[links]`        | Broken-link map, heuristics, fallback page     |
//! | `[canonical]`    | Sample URLs for canonical validation           |
//! | `[serve]`        | HTTP service (interface, port, 404 log size)   |

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    BrokenLinkEntry, CanonicalConfig, ContentConfig, LinksConfig, ServeConfig, SiteSectionConfig,
};
pub(crate) use types::config_fields;
pub use types::{ConfigDiagnostics, ConfigError, FieldPath, cfg, init_config};

use crate::{
    audit::{BrokenLinkMap, LinkAuditor},
    cli::{Cli, Commands},
    core::SiteOrigins,
    log,
    resolve::CanonicalResolver,
    rules::{RedirectRule, RuleTable},
    store::DirStore,
};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing relink.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory containing the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteSectionConfig,

    #[serde(default)]
    pub content: ContentConfig,

    /// Redirect rules, in evaluation order.
    #[serde(default)]
    pub redirects: Vec<RedirectRule>,

    #[serde(default)]
    pub links: LinksConfig,

    #[serde(default)]
    pub canonical: CanonicalConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl SiteConfig {
    /// Field path of the `[[redirects]]` array.
    pub const REDIRECTS: FieldPath = FieldPath::new("redirects");

    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The root is the config
    /// file's parent directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        crate::logger::set_verbose(cli.verbose);

        let (config_path, exists) = Self::resolve_config_path(cli)?;

        if cli.needs_config() && !exists {
            log!("error"; "config file '{}' not found", cli.config.display());
            bail!(ConfigError::Validation(format!(
                "no {} in this directory or any parent",
                cli.config.display()
            )));
        }

        let mut config = if exists {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };

        config.config_path = config_path;
        config.finalize(cli);

        if cli.needs_config() {
            // `rules` reports unsettled chains itself
            let check_chains = !matches!(cli.command, Commands::Rules);
            config.validate_with(check_chains)?;
        }

        Ok(config)
    }

    fn resolve_config_path(cli: &Cli) -> Result<(PathBuf, bool)> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;
        match find_config_file(&cli.config) {
            Some(path) => Ok((path, true)),
            None => Ok((cwd.join(&cli.config), false)),
        }
    }

    /// Resolve paths and apply CLI overrides.
    fn finalize(&mut self, cli: &Cli) {
        let root = self
            .config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        self.root = crate::utils::path::normalize_path(&root);
        self.config_path = crate::utils::path::normalize_path(&self.config_path);

        Self::update_option(&mut self.content.dir, cli.content.as_ref());
        self.content.dir = crate::utils::path::normalize_path(&self.root.join(&self.content.dir));

        self.apply_command_options(cli);
    }

    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Serve { interface, port } = &cli.command {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());

            // Local service without a configured origin
            if self.site.url.is_none() {
                self.site.url = Some(format!(
                    "http://{}:{}",
                    self.serve.interface, self.serve.port
                ));
            }
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // derived components
    // ========================================================================

    /// Canonical origin plus aliases.
    pub fn origins(&self) -> Result<SiteOrigins> {
        let url = self
            .site
            .url
            .as_deref()
            .with_context(|| format!("{} is not configured", SiteSectionConfig::FIELDS.url))?;
        SiteOrigins::new(url, &self.site.aliases)
            .with_context(|| format!("invalid {}", SiteSectionConfig::FIELDS.url))
    }

    /// Resolver over the configured redirect rules.
    pub fn resolver(&self) -> Result<CanonicalResolver> {
        let table = RuleTable::new(self.redirects.clone())?;
        Ok(CanonicalResolver::new(table, self.origins()?))
    }

    pub fn broken_link_map(&self) -> BrokenLinkMap {
        self.links.broken_link_map()
    }

    /// Content store over `content.dir`.
    pub fn store(&self) -> DirStore {
        DirStore::new(&self.content.dir, &self.content.extensions)
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the whole configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        self.validate_with(true)
    }

    fn validate_with(&self, check_chains: bool) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.site.validate(&mut diag);
        self.content.validate(&mut diag);
        self.links.validate(&mut diag);
        self.serve.validate(&mut diag);
        self.validate_redirects(check_chains, &mut diag);
        self.validate_fixes(&mut diag);

        diag.print_warnings();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Every rule compiles and, optionally, no declared path loops.
    fn validate_redirects(&self, check_chains: bool, diag: &mut ConfigDiagnostics) {
        let mut rules = Vec::with_capacity(self.redirects.len());
        for rule in &self.redirects {
            match RuleTable::new(vec![rule.clone()]) {
                Ok(_) => rules.push(rule.clone()),
                Err(e) => diag.error_with_hint(
                    Self::REDIRECTS,
                    e.to_string(),
                    "patterns look like /exact, /prefix*, /blog/:slug or /blog/:slug*",
                ),
            }
        }

        if !check_chains {
            return;
        }
        let (Ok(table), Some(origins)) = (RuleTable::new(rules), self.site.origins()) else {
            return;
        };
        for e in CanonicalResolver::new(table, origins).check_rule_table() {
            diag.error_with_hint(
                Self::REDIRECTS,
                e.to_string(),
                "run `relink rules` to inspect the table",
            );
        }
    }

    /// No suggested fix is reported again on the next scan.
    ///
    /// Checks the values the auditor writes: map fixes and the fallback after
    /// the rule table, and the settled end of token-free rule destinations.
    fn validate_fixes(&self, diag: &mut ConfigDiagnostics) {
        let (Ok(table), Some(origins)) =
            (RuleTable::new(self.redirects.clone()), self.site.origins())
        else {
            return;
        };
        let resolver = CanonicalResolver::new(table, origins);
        let map = self.broken_link_map();
        let auditor =
            LinkAuditor::new(&resolver, &map).follow_redirects(self.links.follow_redirects);

        for fix in auditor.unstable_fixes() {
            diag.error_with_hint(
                LinksConfig::FIELDS.broken,
                format!("suggested fix '{fix}' is itself reported as broken"),
                "a fix must not be a broken path or match one of `links.patterns`",
            );
        }
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config with a minimal `[site]` section.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> SiteConfig {
    let config = format!("[site]\nurl = \"https://example.com\"\n{extra}");
    let (parsed, ignored) = SiteConfig::parse_with_ignored(&config).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
