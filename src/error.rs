//! Error types for snaplock.
//!
//! Uses thiserror for derive macros. Precondition and contention errors are
//! stable sentinels callers can match on; I/O failures carry the lock file
//! path they happened on.

use crate::exit_codes;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for snaplock operations.
#[derive(Error, Debug)]
pub enum SnapLockError {
    /// The caller is not the administrative user.
    #[error("administrator privileges required")]
    NeedsPrivilege,

    /// A non-blocking acquire found the lock held elsewhere.
    #[error("another snap operation is running, try again later")]
    AlreadyLocked,

    /// A release was attempted on a lock that is not held.
    #[error("lock is not held")]
    NotLocked,

    /// The OS refused an operation on the lock file.
    #[error("lock file '{}': {source}", path.display())]
    LockFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Invalid configuration or arguments.
    #[error("{0}")]
    UserError(String),

    /// The guarded command could not be started.
    #[error("Command failed: {0}")]
    CommandError(String),
}

impl SnapLockError {
    /// Wrap an I/O error that happened on the lock file at `path`.
    pub fn lock_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SnapLockError::LockFile {
            path: path.into(),
            source,
        }
    }

    /// Returns the appropriate exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SnapLockError::NeedsPrivilege => exit_codes::PRIVILEGE_FAILURE,
            SnapLockError::AlreadyLocked => exit_codes::LOCK_FAILURE,
            SnapLockError::NotLocked => exit_codes::LOCK_FAILURE,
            SnapLockError::LockFile { .. } => exit_codes::LOCK_FAILURE,
            SnapLockError::UserError(_) => exit_codes::USER_ERROR,
            SnapLockError::CommandError(_) => exit_codes::COMMAND_FAILURE,
        }
    }
}

/// Result type alias for snaplock operations.
pub type Result<T> = std::result::Result<T, SnapLockError>;
