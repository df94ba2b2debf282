//! Exit code constants for the snaplock CLI.
//!
//! - 0: Success
//! - 1: User error (bad args, invalid config)
//! - 2: Privilege failure (not running as administrator)
//! - 3: Lock failure (contended, not held, or lock file unusable)
//! - 4: Command failure (guarded command could not be started)
//!
//! When `snaplock run` starts its command successfully, the command's own
//! exit status is passed through instead.

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments or invalid configuration.
pub const USER_ERROR: i32 = 1;

/// Privilege failure: the caller is not the administrative user.
pub const PRIVILEGE_FAILURE: i32 = 2;

/// Lock failure: the process-wide lock could not be acquired or released.
pub const LOCK_FAILURE: i32 = 3;

/// Command failure: the guarded command could not be spawned.
pub const COMMAND_FAILURE: i32 = 4;
