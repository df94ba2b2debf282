//! CLI argument parsing for snaplock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// snaplock: run commands under the process-wide snap lock.
///
/// Privileged snap operations serialize through a single advisory file lock.
/// This tool takes that lock around arbitrary commands and reports who holds it.
#[derive(Parser, Debug)]
#[command(name = "snaplock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Config file (default: /etc/snaplock/config.yaml when present).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the lock file path from the config.
    #[arg(long, global = true, value_name = "PATH")]
    pub lock_file: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for snaplock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a command while holding the process-wide lock.
    ///
    /// Fails immediately if another process holds the lock, unless
    /// `--retry` is given. Exits with the command's exit status.
    Run(RunArgs),

    /// Show whether the process-wide lock is held and by whom.
    Status,
}

/// Arguments for the `run` command.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Keep retrying while another process holds the lock.
    #[arg(long)]
    pub retry: bool,

    /// Action name recorded in the lock holder metadata.
    #[arg(long, default_value = "run")]
    pub action: String,

    /// The command to run, followed by its arguments.
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_status() {
        let cli = Cli::try_parse_from(["snaplock", "status"]).unwrap();
        assert!(matches!(cli.command, Command::Status));
        assert!(cli.config.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn parse_run_minimal() {
        let cli = Cli::try_parse_from(["snaplock", "run", "--", "true"]).unwrap();
        if let Command::Run(args) = cli.command {
            assert_eq!(args.command, vec!["true"]);
            assert_eq!(args.action, "run");
            assert!(!args.retry);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_full() {
        let cli = Cli::try_parse_from([
            "snaplock",
            "-vv",
            "--lock-file",
            "/tmp/test.lock",
            "run",
            "--retry",
            "--action",
            "install",
            "--",
            "snap",
            "install",
            "--classic",
            "hello",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.lock_file, Some(PathBuf::from("/tmp/test.lock")));
        if let Command::Run(args) = cli.command {
            assert!(args.retry);
            assert_eq!(args.action, "install");
            assert_eq!(args.command, vec!["snap", "install", "--classic", "hello"]);
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn parse_run_requires_command() {
        assert!(Cli::try_parse_from(["snaplock", "run"]).is_err());
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli =
            Cli::try_parse_from(["snaplock", "status", "--config", "/etc/x.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/etc/x.yaml")));
    }
}
