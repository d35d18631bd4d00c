//! Core types shared across the codebase.

mod link;
mod origin;
mod state;
mod url;

pub use link::LinkKind;
pub use origin::SiteOrigins;
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
pub use url::UrlPath;
