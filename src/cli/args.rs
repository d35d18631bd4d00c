//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Canonical URL resolver and broken-link auditor
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Content directory path (relative to the config file)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub content: Option<PathBuf>,

    /// Config file path (default: relink.toml)
    #[arg(short = 'C', long, default_value = "relink.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Commands that work without a config file.
    pub fn needs_config(&self) -> bool {
        !matches!(self.command, Commands::Match { .. })
    }
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Resolve paths through the redirect rules to their canonical URL
    #[command(visible_alias = "r")]
    Resolve {
        /// Paths or URLs to resolve
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,

        /// Base URL for the canonical URL (default: `site.url`)
        #[arg(short, long, value_hint = clap::ValueHint::Url)]
        base_url: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Validate that URLs are already canonical
    #[command(visible_alias = "c")]
    Check {
        /// URLs to validate. If omitted, validates `canonical.samples`.
        #[arg(value_name = "URL")]
        urls: Vec<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List redirect rules and report chains that never settle
    Rules,

    /// Test a single path against a pattern
    #[command(visible_alias = "m")]
    Match {
        /// Source pattern (`/exact`, `/prefix*`, `/blog/:slug*`)
        pattern: String,

        /// Path to test
        path: String,

        /// Destination template to substitute
        destination: Option<String>,
    },

    /// Report broken internal links in the content directory
    #[command(visible_alias = "s")]
    Scan {
        #[command(flatten)]
        args: ScanArgs,
    },

    /// Rewrite broken internal links in place
    #[command(visible_alias = "f")]
    Fix {
        /// Show what would change without writing
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Start the HTTP service
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// Scan command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct ScanArgs {
    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    /// Show at most N findings
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,

    /// Treat broken links as warnings instead of errors
    #[arg(long, short = 'w')]
    pub warn_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scan() {
        let cli = Cli::parse_from(["relink", "-C", "site.toml", "scan", "-n", "5", "--json", "-v"]);
        assert_eq!(cli.config, PathBuf::from("site.toml"));
        assert!(cli.verbose);
        match cli.command {
            Commands::Scan { args } => {
                assert_eq!(args.limit, Some(5));
                assert!(args.json);
                assert!(!args.warn_only);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_match_needs_no_config() {
        let cli = Cli::parse_from(["relink", "match", "/blog/:slug*", "/blog/a", "/:slug*"]);
        assert!(!cli.needs_config());
        let cli = Cli::parse_from(["relink", "resolve", "/a"]);
        assert!(cli.needs_config());
    }
}
