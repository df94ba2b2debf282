//! Hierarchical per-snap locking.
//!
//! A [`LockMap`] maps dotted snap keys to reader/writer locks. The empty key
//! is the root: taking it exclusively excludes every other key, while any
//! non-empty key takes the root shared before taking its own lock. That
//! gives three regimes:
//!
//! - many readers across distinct snaps: root shared + leaf shared
//! - one writer per snap: root shared + leaf exclusive, other snaps proceed
//! - a global writer: root exclusive, nothing else proceeds
//!
//! The map holds the [process-wide guard](crate::guard) while any key is held,
//! so independent processes are excluded too.
//!
//! # Ordering
//!
//! Acquisition always goes process guard, then root, then leaf; release goes
//! the other way. Callers must not re-enter the map for a key they already
//! hold.
//!
//! # Acquire and release
//!
//! ```text
//! lock/rlock:                         unlock/runlock:
//!   1. take bookkeeping mutex           1. take bookkeeping mutex
//!   2. first holder? take guard         2. release leaf
//!   3. find/create root + leaf          3. leaf != root? release root share,
//!   4. drop bookkeeping mutex              drop count, reclaim leaf at zero
//!   5. leaf != root? share root         4. last holder? release guard
//!   6. lock leaf                        5. drop bookkeeping mutex
//!   7. record the hold
//! ```
//!
//! Releasing the process guard is not allowed to fail: the holder count could
//! no longer match the OS state, so a failure there panics.

mod keyed;


pub use keyed::{KeyGuard, KeyedLock};

use crate::config::Config;
use crate::error::{Result, SnapLockError};
use crate::guard::ProcessGuard;
use parking_lot::lock_api::{ArcRwLockReadGuard, ArcRwLockWriteGuard};
use parking_lot::{Mutex, RawRwLock, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

/// Key parts naming the root, for callers that want every snap.
pub const ROOT_KEY: &[&str] = &[];

const ROOT: &str = "";

type ReadHold = ArcRwLockReadGuard<RawRwLock, ()>;
type WriteHold = ArcRwLockWriteGuard<RawRwLock, ()>;

/// Join key parts with `.`; no parts means the root.
pub fn join_key<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".")
}

/// Which side of a key's reader/writer lock an operation uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Exclusive,
    Shared,
}

#[derive(Default)]
struct Node {
    lock: Arc<RwLock<()>>,
    /// In-flight operations on this key, including waiters. Unused for the root.
    count: usize,
    writer: Option<WriteHold>,
    readers: Vec<ReadHold>,
    /// Root shares taken on behalf of this key's holders.
    root_shares: Vec<ReadHold>,
}

struct MapState {
    nodes: HashMap<String, Node>,
    guard: ProcessGuard,
    holders: usize,
}

impl MapState {
    fn node(&mut self, key: &str) -> &mut Node {
        self.nodes.entry(key.to_string()).or_default()
    }

    fn enter(&mut self, key: &str) -> Result<(Arc<RwLock<()>>, Arc<RwLock<()>>)> {
        if self.holders == 0 {
            self.guard.lock()?;
            tracing::debug!("lock map took the process-wide lock");
        }
        self.holders += 1;

        let root = Arc::clone(&self.node(ROOT).lock);
        let node = self.node(key);
        if !key.is_empty() {
            node.count += 1;
        }
        Ok((root, Arc::clone(&node.lock)))
    }

    fn record(&mut self, key: &str, root_share: Option<ReadHold>, hold: Hold) {
        let node = self.node(key);
        match hold {
            Hold::Write(guard) => node.writer = Some(guard),
            Hold::Read(guard) => node.readers.push(guard),
        }
        node.root_shares.extend(root_share);
    }

    fn leave(&mut self, key: &str, mode: LockMode) -> Result<()> {
        let node = self.nodes.get_mut(key).ok_or(SnapLockError::NotLocked)?;
        let released = match mode {
            LockMode::Exclusive => node.writer.take().map(drop),
            LockMode::Shared => node.readers.pop().map(drop),
        };
        if released.is_none() {
            return Err(SnapLockError::NotLocked);
        }

        if !key.is_empty() {
            drop(node.root_shares.pop());
            node.count -= 1;
            if node.count == 0 {
                self.nodes.remove(key);
                tracing::trace!(key, "reclaimed lock map node");
            }
        }

        self.holders -= 1;
        if self.holders == 0 {
            if let Err(e) = self.guard.unlock() {
                panic!(
                    "cannot release process-wide lock '{}': {}",
                    self.guard.path().display(),
                    e
                );
            }
            tracing::debug!("lock map released the process-wide lock");
        }
        Ok(())
    }
}

enum Hold {
    Write(WriteHold),
    Read(ReadHold),
}

/// Per-snap reader/writer locks layered over the process-wide guard.
///
/// A map built with locking disabled accepts every call and does nothing.
pub struct LockMap {
    state: Option<Mutex<MapState>>,
}

impl std::fmt::Debug for LockMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            Some(state) => {
                let state = state.lock();
                f.debug_struct("LockMap")
                    .field("guard", &state.guard)
                    .field("holders", &state.holders)
                    .field("keys", &state.nodes.len())
                    .finish()
            }
            None => f.write_str("LockMap(disabled)"),
        }
    }
}

impl LockMap {
    /// Create a map that takes `guard` while any key is held.
    pub fn new(guard: ProcessGuard) -> Self {
        Self {
            state: Some(Mutex::new(MapState {
                nodes: HashMap::new(),
                guard,
                holders: 0,
            })),
        }
    }

    /// Create a map on the configured lock file, or a disabled map when
    /// `disable_locking` is set.
    pub fn from_config(config: &Config) -> Self {
        if config.disable_locking {
            Self::disabled()
        } else {
            Self::new(ProcessGuard::from_config(config))
        }
    }

    /// Create a map whose operations are all no-ops.
    pub fn disabled() -> Self {
        Self { state: None }
    }

    /// Whether operations on this map actually lock.
    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    /// Lock `key` exclusively.
    pub fn lock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        self.acquire(&join_key(key), LockMode::Exclusive)
    }

    /// Release an exclusive hold on `key`.
    pub fn unlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        self.release(&join_key(key), LockMode::Exclusive)
    }

    /// Lock `key` shared.
    pub fn rlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        self.acquire(&join_key(key), LockMode::Shared)
    }

    /// Release a shared hold on `key`.
    pub fn runlock<S: AsRef<str>>(&self, key: &[S]) -> Result<()> {
        self.release(&join_key(key), LockMode::Shared)
    }

    /// Lock `key` exclusively until the returned guard is dropped.
    pub fn write<S: AsRef<str>>(&self, key: &[S]) -> Result<KeyGuard<'_>> {
        KeyGuard::acquire(self, join_key(key), LockMode::Exclusive)
    }

    /// Lock `key` shared until the returned guard is dropped.
    pub fn read<S: AsRef<str>>(&self, key: &[S]) -> Result<KeyGuard<'_>> {
        KeyGuard::acquire(self, join_key(key), LockMode::Shared)
    }

    /// Number of outstanding acquisitions across all keys.
    pub fn holders(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.lock().holders)
    }

    /// Keys that currently have a node, sorted; the root shows up as `""`.
    pub fn keys(&self) -> Vec<String> {
        let Some(state) = &self.state else {
            return Vec::new();
        };
        let mut keys: Vec<String> = state.lock().nodes.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Whether the process-wide lock is currently held by this map.
    pub fn guard_held(&self) -> bool {
        self.state
            .as_ref()
            .is_some_and(|state| state.lock().guard.is_held())
    }

    pub(crate) fn acquire(&self, key: &str, mode: LockMode) -> Result<()> {
        let Some(state) = &self.state else {
            return Ok(());
        };

        let (root, node) = state.lock().enter(key)?;

        let root_share = (!key.is_empty()).then(|| root.read_arc());
        let hold = match mode {
            LockMode::Exclusive => Hold::Write(node.write_arc()),
            LockMode::Shared => Hold::Read(node.read_arc()),
        };

        state.lock().record(key, root_share, hold);
        tracing::trace!(key, ?mode, "lock map key acquired");
        Ok(())
    }

    pub(crate) fn release(&self, key: &str, mode: LockMode) -> Result<()> {
        let Some(state) = &self.state else {
            return Ok(());
        };

        state.lock().leave(key, mode)?;
        tracing::trace!(key, ?mode, "lock map key released");
        Ok(())
    }
}
