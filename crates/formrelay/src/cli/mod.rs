//! Command-line interface for formrelay.
//!
//! This module provides the CLI structure for the `formrelay` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, RecentCommand, ServeCommand};

/// formrelay - Contact-form intake service
///
/// Accepts contact-form submissions over HTTP, relays them to a support
/// inbox over SMTP, auto-replies to the submitter, and keeps a local JSON
/// log of every submission.
#[derive(Debug, Parser)]
#[command(name = "formrelay")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Show the most recent submissions from the log
    Recent(RecentCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "formrelay");
    }

    #[test]
    fn test_verbosity_flags() {
        let quiet = Cli::try_parse_from(["formrelay", "-q", "serve"]).unwrap();
        assert_eq!(quiet.verbosity(), crate::logging::Verbosity::Quiet);

        let normal = Cli::try_parse_from(["formrelay", "serve"]).unwrap();
        assert_eq!(normal.verbosity(), crate::logging::Verbosity::Normal);

        let verbose = Cli::try_parse_from(["formrelay", "-v", "serve"]).unwrap();
        assert_eq!(verbose.verbosity(), crate::logging::Verbosity::Verbose);

        let trace = Cli::try_parse_from(["formrelay", "-vv", "serve"]).unwrap();
        assert_eq!(trace.verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_parse_serve_with_bind() {
        let cli = Cli::try_parse_from(["formrelay", "serve", "--bind", "127.0.0.1:8080"]).unwrap();
        match cli.command {
            Command::Serve(cmd) => assert_eq!(cmd.bind.as_deref(), Some("127.0.0.1:8080")),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_recent_defaults() {
        let cli = Cli::try_parse_from(["formrelay", "recent"]).unwrap();
        match cli.command {
            Command::Recent(cmd) => {
                assert_eq!(cmd.limit, 20);
                assert!(!cmd.json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_config_validate() {
        let cli =
            Cli::try_parse_from(["formrelay", "config", "validate", "-f", "/tmp/c.toml"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Config(ConfigCommand::Validate { .. })
        ));
    }

    #[test]
    fn test_parse_with_config() {
        let cli = Cli::try_parse_from(["formrelay", "-c", "/custom/config.toml", "serve"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }
}
