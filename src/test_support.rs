use crate::error::{Result, SnapLockError};
use crate::guard::{GuardBackend, ProcessGuard};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Observable state of a [`FakeBackend`], shared with the test body.
#[derive(Debug)]
pub(crate) struct FakeState {
    pub(crate) admin: bool,
    pub(crate) held: bool,
    pub(crate) contended: bool,
    pub(crate) fail_acquire: bool,
    pub(crate) fail_release: bool,
    pub(crate) acquires: usize,
    pub(crate) releases: usize,
}

/// In-memory stand-in for the flock backend.
#[derive(Debug, Clone)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
    path: PathBuf,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                admin: true,
                held: false,
                contended: false,
                fail_acquire: false,
                fail_release: false,
                acquires: 0,
                releases: 0,
            })),
            path: PathBuf::from("/run/fake-snapd.lock"),
        }
    }

    pub(crate) fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    pub(crate) fn acquires(&self) -> usize {
        self.state().acquires
    }

    pub(crate) fn releases(&self) -> usize {
        self.state().releases
    }

    pub(crate) fn is_held(&self) -> bool {
        self.state().held
    }
}

impl GuardBackend for FakeBackend {
    fn is_admin(&self) -> bool {
        self.state().admin
    }

    fn acquire(&mut self, blocking: bool) -> Result<()> {
        let mut state = self.state();
        if state.fail_acquire {
            return Err(SnapLockError::lock_file(
                &self.path,
                io::Error::other("acquire failed"),
            ));
        }
        if state.contended && !blocking {
            return Err(SnapLockError::AlreadyLocked);
        }
        assert!(!state.held, "fake lock acquired twice");
        state.held = true;
        state.acquires += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        let mut state = self.state();
        state.held = false;
        if state.fail_release {
            return Err(SnapLockError::lock_file(
                &self.path,
                io::Error::other("release failed"),
            ));
        }
        state.releases += 1;
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// A process guard over a fresh fake backend, plus a handle to inspect it.
pub(crate) fn fake_guard() -> (ProcessGuard, FakeBackend) {
    let backend = FakeBackend::new();
    (ProcessGuard::with_backend(backend.clone()), backend)
}
