//! `[canonical]` section configuration.
//!
//! ```toml
//! [canonical]
//! samples = ["/", "/latest", "https://example.com/about"]
//! ```

use serde::{Deserialize, Serialize};

/// URLs validated by `relink check` and `GET /api/validate-canonical` when
/// no explicit list is given.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanonicalConfig {
    pub samples: Vec<String>,
}

impl Default for CanonicalConfig {
    fn default() -> Self {
        Self {
            samples: vec!["/".into()],
        }
    }
}
