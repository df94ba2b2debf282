//! snaplock: hierarchical per-snap advisory locking.
//!
//! Privileged snap operations coordinate through two layers:
//!
//! - [`guard::ProcessGuard`]: one advisory file lock on a well-known path,
//!   excluding other processes of the same tool.
//! - [`lockmap::LockMap`]: in-process reader/writer locks keyed by snap name,
//!   with the empty key acting as a global lock over every snap. The map holds
//!   the process guard while any key is held.
//!
//! ```no_run
//! use snaplock::config::Config;
//! use snaplock::lockmap::LockMap;
//!
//! let config = Config::load_or_default(snaplock::config::DEFAULT_CONFIG_PATH)?;
//! let locks = LockMap::from_config(&config);
//!
//! let _hold = locks.write(&["core", "install"])?;
//! // mutate state belonging to the "core.install" key
//! # Ok::<(), snaplock::error::SnapLockError>(())
//! ```

pub mod config;
pub mod error;
pub mod exit_codes;
pub mod guard;
pub mod lockmap;

#[cfg(test)]
mod test_support;

pub use error::{Result, SnapLockError};
pub use guard::{GuardBackend, ProcessGuard};
pub use lockmap::{KeyGuard, KeyedLock, LockMap};
