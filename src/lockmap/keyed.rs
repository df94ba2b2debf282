//! Keyed locking trait and RAII key guards.

use super::{LockMap, LockMode};
use crate::error::Result;

/// The lock/unlock surface of a [`LockMap`].
///
/// Implemented for `Option<L>` so an absent map (`None`) can be passed around
/// in place of a real one; every call on it succeeds without doing anything.
pub trait KeyedLock {
    /// Lock `key` exclusively.
    fn lock<S: AsRef<str>>(&self, key: &[S]) -> Result<()>;

    /// Release an exclusive hold on `key`.
    fn unlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()>;

    /// Lock `key` shared.
    fn rlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()>;

    /// Release a shared hold on `key`.
    fn runlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()>;
}

impl KeyedLock for LockMap {
    fn lock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        LockMap::lock(self, key)
    }

    fn unlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        LockMap::unlock(self, key)
    }

    fn rlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        LockMap::rlock(self, key)
    }

    fn runlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        LockMap::runlock(self, key)
    }
}

impl<L: KeyedLock> KeyedLock for Option<L> {
    fn lock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        self.as_ref().map_or(Ok(()), |inner| inner.lock(key))
    }

    fn unlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        self.as_ref().map_or(Ok(()), |inner| inner.unlock(key))
    }

    fn rlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        self.as_ref().map_or(Ok(()), |inner| inner.rlock(key))
    }

    fn runlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        self.as_ref().map_or(Ok(()), |inner| inner.runlock(key))
    }
}

/// RAII hold on one key of a [`LockMap`].
///
/// Dropping the guard releases the hold. If the release fails during drop, a
/// warning is logged.
#[derive(Debug)]
pub struct KeyGuard<'a> {
    map: &'a LockMap,
    key: String,
    mode: LockMode,
    released: bool,
}

impl<'a> KeyGuard<'a> {
    pub(super) fn acquire(map: &'a LockMap, key: String, mode: LockMode) -> Result<Self> {
        map.acquire(&key, mode)?;
        Ok(Self {
            map,
            key,
            mode,
            released: false,
        })
    }

    /// The joined key this guard holds.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether this is an exclusive or shared hold.
    pub fn mode(&self) -> LockMode {
        self.mode
    }

    /// Release the hold now and report the outcome.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.map.release(&self.key, self.mode)
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = self.map.release(&self.key, self.mode)
        {
            tracing::warn!(key = %self.key, error = %e, "failed to release lock map key");
        }
    }
}
