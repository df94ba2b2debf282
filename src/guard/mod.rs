//! Process-wide guard.
//!
//! A single advisory file lock on a well-known path that excludes independent
//! processes performing privileged snap operations. Every operation first
//! checks that the caller is an administrator.
//!
//! # Backends
//!
//! The guard talks to the host through [`GuardBackend`], which bundles the
//! privilege check with acquiring and releasing the OS lock. Production code
//! uses [`FlockBackend`]; tests substitute an in-memory backend.
//!
//! # Scoped use
//!
//! [`ProcessGuard::with_guard`] runs a closure with the lock held and
//! releases it on every exit path, including unwinding.
//! [`ProcessGuard::with_guard_retry`] additionally backs off and retries
//! while another process holds the lock.

mod flock;
mod metadata;
mod privilege;


pub use flock::FlockBackend;
pub use metadata::LockMetadata;
pub use privilege::is_root;

use crate::config::Config;
use crate::error::{Result, SnapLockError};
use std::path::Path;
use std::time::Duration;

/// Host capabilities the process-wide guard relies on.
pub trait GuardBackend: Send {
    /// Whether the calling process counts as an administrator.
    fn is_admin(&self) -> bool;

    /// Take the OS lock exclusively.
    ///
    /// With `blocking == false`, a contended lock yields
    /// [`SnapLockError::AlreadyLocked`] instead of waiting.
    fn acquire(&mut self, blocking: bool) -> Result<()>;

    /// Release the OS lock and drop the handle.
    fn release(&mut self) -> Result<()>;

    /// Path of the lock file, for diagnostics.
    fn path(&self) -> &Path;
}

/// How long to back off and how often to retry a contended lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub wait: Duration,

    /// Retries after the first attempt; `None` retries forever.
    pub max_retries: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            wait: Duration::from_secs(5),
            max_retries: None,
        }
    }
}

/// The process-wide mutual exclusion primitive.
pub struct ProcessGuard {
    backend: Box<dyn GuardBackend>,
    held: bool,
}

impl std::fmt::Debug for ProcessGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessGuard")
            .field("path", &self.backend.path())
            .field("held", &self.held)
            .finish()
    }
}

impl ProcessGuard {
    /// Create a guard over an arbitrary backend.
    pub fn with_backend(backend: impl GuardBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            held: false,
        }
    }

    /// Create a guard on the configured lock file.
    pub fn from_config(config: &Config) -> Self {
        Self::with_backend(FlockBackend::new(
            config.lock_path(),
            config.privilege_check,
        ))
    }

    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        self.backend.path()
    }

    /// Whether this guard currently holds the lock.
    pub fn is_held(&self) -> bool {
        self.held
    }

    fn check_privilege(&self) -> Result<()> {
        if !self.backend.is_admin() {
            return Err(SnapLockError::NeedsPrivilege);
        }
        Ok(())
    }

    fn acquire(&mut self, blocking: bool) -> Result<()> {
        self.check_privilege()?;

        // Not reentrant; a second acquire on the same handle would self-deadlock.
        if self.held {
            return Err(SnapLockError::AlreadyLocked);
        }

        self.backend.acquire(blocking)?;
        self.held = true;
        tracing::debug!(
            path = %self.path().display(),
            blocking,
            "process-wide lock acquired"
        );
        Ok(())
    }

    /// Acquire the lock, blocking while another process holds it.
    pub fn lock(&mut self) -> Result<()> {
        self.acquire(true)
    }

    /// Acquire the lock, or fail with [`SnapLockError::AlreadyLocked`] if it is
    /// held elsewhere.
    pub fn try_lock(&mut self) -> Result<()> {
        self.acquire(false)
    }

    /// Release the lock.
    ///
    /// Fails with [`SnapLockError::NotLocked`] if the guard was never acquired.
    pub fn unlock(&mut self) -> Result<()> {
        self.check_privilege()?;

        if !self.held {
            return Err(SnapLockError::NotLocked);
        }

        // The handle is gone after release, successful or not.
        self.held = false;
        self.backend.release()?;
        tracing::debug!(path = %self.path().display(), "process-wide lock released");
        Ok(())
    }

    /// Run `f` with the lock held.
    ///
    /// Uses [`try_lock`](Self::try_lock), so a contended lock fails fast with
    /// [`SnapLockError::AlreadyLocked`] and `f` is not run. The lock is
    /// released whether `f` succeeds, fails or panics.
    pub fn with_guard<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        self.try_lock()?;
        self.run_locked(f)
    }

    /// Like [`with_guard`](Self::with_guard), but waits and retries while the
    /// lock is contended.
    ///
    /// `on_wait` is called with the pause length and the 1-based retry number
    /// before each pause. Once `policy.max_retries` is exhausted the last
    /// [`SnapLockError::AlreadyLocked`] is returned.
    pub fn with_guard_retry<T, F, W>(
        &mut self,
        policy: &RetryPolicy,
        mut on_wait: W,
        f: F,
    ) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
        W: FnMut(Duration, u32),
    {
        let mut retries = 0u32;
        loop {
            match self.try_lock() {
                Ok(()) => break,
                Err(SnapLockError::AlreadyLocked) => {
                    if policy.max_retries.is_some_and(|max| retries >= max) {
                        return Err(SnapLockError::AlreadyLocked);
                    }
                    retries += 1;
                    on_wait(policy.wait, retries);
                    std::thread::sleep(policy.wait);
                }
                Err(e) => return Err(e),
            }
        }

        self.run_locked(f)
    }

    fn run_locked<T, F>(&mut self, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut scope = Scoped {
            guard: self,
            released: false,
        };
        let result = f();
        let released = scope.release();

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release_err)) => {
                tracing::warn!(error = %release_err, "failed to release process-wide lock");
                Err(e)
            }
        }
    }
}

/// Releases the guard if dropped before `release`, i.e. while unwinding.
struct Scoped<'a> {
    guard: &'a mut ProcessGuard,
    released: bool,
}

impl Scoped<'_> {
    fn release(&mut self) -> Result<()> {
        self.released = true;
        self.guard.unlock()
    }
}

impl Drop for Scoped<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.guard.unlock()
        {
            tracing::warn!(error = %e, "failed to release process-wide lock");
        }
    }
}
