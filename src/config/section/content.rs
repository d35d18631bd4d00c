//! `[content]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [content]
//! dir = "content"                     # relative to the config file
//! extensions = ["html", "htm", "md"]  # files treated as documents
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, config_fields};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub dir: PathBuf,
    pub extensions: Vec<String>,
}

config_fields!(ContentConfig => ContentFields, "content" { dir, extensions });

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: "content".into(),
            extensions: vec!["html".into(), "htm".into(), "md".into()],
        }
    }
}

impl ContentConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.extensions.iter().all(|e| e.trim_start_matches('.').is_empty()) {
            diag.error_with_hint(
                Self::FIELDS.extensions,
                "no document extensions configured",
                "e.g.: extensions = [\"html\", \"md\"]",
            );
        }
        if !self.dir.is_dir() {
            diag.warn(
                Self::FIELDS.dir,
                format!("content directory `{}` does not exist", self.dir.display()),
            );
        }
    }
}
