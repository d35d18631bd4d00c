//! Configuration section definitions.
//!
//! Each module corresponds to a section in `relink.toml`:
//!
//! | Module      | TOML Section      | Purpose                             |
//! |-------------|-------------------|-------------------------------------|
//! | `site`      | `[site]`          | Canonical origin and alias domains  |
//! | `content`   | `[content]`       | Content directory and file types    |
//! | `links`     | `[links]`         | Broken-link map and heuristics      |
//! | `canonical` | `[canonical]`     | Sample URLs for validation          |
//! | `serve`     | `[serve]`         | HTTP service                        |
//!
//! Redirect rules live in the top-level `[[redirects]]` array.

mod canonical;
mod content;
mod links;
mod serve;
mod site;

pub use canonical::CanonicalConfig;
pub use content::ContentConfig;
pub use links::{BrokenLinkEntry, LinksConfig};
pub use serve::ServeConfig;
pub use site::SiteSectionConfig;
