//! Holder metadata written into the process-wide lock file.
//!
//! The metadata is diagnostic only: whoever holds the flock rewrites it after
//! acquiring, and nothing about lock semantics depends on it. After a release
//! the file still describes the last holder.

use crate::error::{Result, SnapLockError};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Metadata describing the process that last took the lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockMetadata {
    /// Owner of the lock (e.g., `root@HOST`).
    pub owner: String,

    /// Process ID of the lock holder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// When the lock was taken (RFC3339).
    pub created_at: DateTime<Utc>,

    /// What the holder was doing (install/refresh/run/etc.).
    pub action: String,
}

impl LockMetadata {
    /// Create new lock metadata with the current timestamp.
    pub fn new(action: &str) -> Self {
        Self {
            owner: get_owner_string(),
            pid: Some(std::process::id()),
            created_at: Utc::now(),
            action: action.to_string(),
        }
    }

    /// Parse lock metadata from a lock file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| SnapLockError::lock_file(path, e))?;

        serde_json::from_str(&content).map_err(|e| {
            SnapLockError::UserError(format!(
                "failed to parse lock metadata in '{}': {}",
                path.display(),
                e
            ))
        })
    }

    /// Serialize lock metadata to JSON string.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            SnapLockError::UserError(format!("failed to serialize lock metadata: {}", e))
        })
    }

    /// Time since the lock was taken.
    pub fn age(&self) -> Duration {
        Utc::now().signed_duration_since(self.created_at)
    }

    /// Format the age as a human-readable string.
    pub fn age_string(&self) -> String {
        let age = self.age();
        let minutes = age.num_minutes();
        let hours = age.num_hours();
        let days = age.num_days();

        if days > 0 {
            format!("{}d {}h", days, hours % 24)
        } else if hours > 0 {
            format!("{}h {}m", hours, minutes % 60)
        } else {
            format!("{}m", minutes)
        }
    }
}

impl std::fmt::Display for LockMetadata {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.owner)?;
        if let Some(pid) = self.pid {
            write!(f, " (pid {})", pid)?;
        }
        write!(f, ", action: {}, age: {}", self.action, self.age_string())
    }
}

/// Get the owner string for lock metadata.
pub(crate) fn get_owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .ok();
    owner_string(user)
}

/// Format `user@host`, with `unknown` standing in for either part.
fn owner_string(user: Option<String>) -> String {
    let user = user.unwrap_or_else(|| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}
