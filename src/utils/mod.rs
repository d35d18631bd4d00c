//! Shared helpers with no domain state.

pub mod html;
pub mod mime;
pub mod path;
pub mod pattern;
mod plural;

pub use plural::{plural_count, plural_s};
