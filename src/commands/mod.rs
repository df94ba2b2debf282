//! Command implementations for snaplock.
//!
//! This module provides the dispatcher that loads configuration and routes
//! CLI commands to their implementations.

mod run;
mod status;

use crate::cli::{Cli, Command};
use snaplock::config::{Config, DEFAULT_CONFIG_PATH};
use snaplock::error::Result;
use std::path::PathBuf;

/// Dispatch a command to its implementation.
///
/// Returns the process exit code on success; for `run` that is the exit
/// status of the guarded command.
pub fn dispatch(cli: Cli) -> Result<i32> {
    let config = load_config(cli.config, cli.lock_file)?;

    match cli.command {
        Command::Run(args) => run::cmd_run(&config, args),
        Command::Status => status::cmd_status(&config),
    }
}

/// Load the explicit config file, or the default one when it exists, and
/// apply command line overrides.
fn load_config(path: Option<PathBuf>, lock_file: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(DEFAULT_CONFIG_PATH)?,
    };

    if lock_file.is_some() {
        config.lock_file_path = lock_file;
        config.validate()?;
    }

    tracing::debug!(lock_path = %config.lock_path().display(), "configuration loaded");
    Ok(config)
}
