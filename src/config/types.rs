//! Configuration types and defaults for snaplock.
//!
//! This module defines enums, constants, and default value functions
//! used by the Config struct.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Lock file name under the run directory.
pub const LOCK_FILE_NAME: &str = "snapd.lock";

/// Run directory relative to `root_dir`.
pub const RUN_DIR: &str = "run";

/// Where the binary looks for a config file when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/snaplock/config.yaml";

/// How the process guard decides whether the caller is an administrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PrivilegeCheck {
    /// Require the real user id to be 0 (default).
    #[default]
    Root,
    /// Treat every caller as an administrator.
    Bypass,
    /// Treat every caller as unprivileged.
    Deny,
}

pub(crate) fn default_root_dir() -> PathBuf {
    PathBuf::from("/")
}
pub(crate) fn default_retry_wait_seconds() -> u64 {
    5
}
