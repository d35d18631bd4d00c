//! Relink - canonical URL resolver and broken-link auditor for content sites.

#![allow(dead_code)]

mod audit;
mod cli;
mod config;
mod core;
mod logger;
mod notfound;
mod resolve;
mod rules;
mod store;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands, canonical, common::App, links};
use config::{SiteConfig, init_config};

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    core::setup_shutdown_handler()?;

    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = init_config(SiteConfig::load(cli)?);

    if let Commands::Match {
        pattern,
        path,
        destination,
    } = &cli.command
    {
        return canonical::run_match(pattern, path, destination.as_deref());
    }

    let app = App::new(config)?;
    match &cli.command {
        Commands::Resolve {
            paths,
            base_url,
            json,
        } => canonical::run_resolve(&app, paths, base_url.as_deref(), *json),
        Commands::Check { urls, json } => canonical::run_check(&app, urls, *json),
        Commands::Rules => canonical::run_rules(&app),
        Commands::Scan { args } => links::run_scan(&app, args),
        Commands::Fix { dry_run } => links::run_fix(&app, *dry_run),
        Commands::Serve { .. } => cli::serve::bind_server()?.run(app),
        Commands::Match { .. } => unreachable!("handled above"),
    }
}
