//! Command-line interface module.

mod args;
pub mod canonical;
pub mod common;
pub mod links;
pub mod serve;

pub use args::{Cli, Commands, ScanArgs};
