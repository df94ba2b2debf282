//! Config struct definition and default implementation.

use super::types::*;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for snaplock.
///
/// This struct represents the contents of `/etc/snaplock/config.yaml`.
/// Unknown fields in the YAML are ignored for forward compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // =========================================================================
    // Paths
    // =========================================================================
    /// Root directory that derived system paths hang off (default: "/").
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,

    /// Explicit path of the process-wide lock file.
    ///
    /// When unset, the lock lives at `<root_dir>/run/snapd.lock`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_file_path: Option<PathBuf>,

    // =========================================================================
    // Lock settings
    // =========================================================================
    /// Turn the lock map into a no-op.
    #[serde(default)]
    pub disable_locking: bool,

    /// How callers are checked for administrator privileges.
    #[serde(default)]
    pub privilege_check: PrivilegeCheck,

    // =========================================================================
    // Retry settings
    // =========================================================================
    /// Seconds to wait between attempts when the lock is contended.
    #[serde(default = "default_retry_wait_seconds")]
    pub retry_wait_seconds: u64,

    /// Maximum number of retries after the first attempt (unset: forever).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            lock_file_path: None,
            disable_locking: false,
            privilege_check: PrivilegeCheck::default(),
            retry_wait_seconds: default_retry_wait_seconds(),
            max_retries: None,
        }
    }
}
