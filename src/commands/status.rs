//! `snaplock status`: report the state of the process-wide lock.

use snaplock::config::Config;
use snaplock::error::{Result, SnapLockError};
use snaplock::guard::{FlockBackend, LockMetadata, ProcessGuard};
use std::path::Path;

/// Whether the lock is currently held, as seen by a non-blocking probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LockState {
    Free,
    Held,
    /// Probing needs administrator privileges.
    Unknown,
}

impl LockState {
    fn as_str(&self) -> &'static str {
        match self {
            LockState::Free => "free",
            LockState::Held => "held",
            LockState::Unknown => "unknown (administrator privileges required to probe)",
        }
    }
}

pub fn cmd_status(config: &Config) -> Result<i32> {
    let path = config.lock_path();

    // Read before probing; the probe leaves the contents alone but the
    // holder may be replaced at any moment.
    let last_holder = read_last_holder(&path);
    let state = probe(config)?;

    println!("Lock file:    {}", path.display());
    println!("State:        {}", state.as_str());
    match last_holder {
        Some(meta) => {
            let label = if state == LockState::Held {
                "Holder:"
            } else {
                "Last holder:"
            };
            println!("{:<13} {}", label, meta);
            println!(
                "Taken at:     {}",
                meta.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        None => println!("Last holder:  none recorded"),
    }

    Ok(snaplock::exit_codes::SUCCESS)
}

fn read_last_holder(path: &Path) -> Option<LockMetadata> {
    if !path.exists() {
        return None;
    }
    match LockMetadata::from_file(path) {
        Ok(meta) => Some(meta),
        Err(e) => {
            tracing::debug!(error = %e, "no usable holder metadata");
            None
        }
    }
}

fn probe(config: &Config) -> Result<LockState> {
    let mut guard = ProcessGuard::with_backend(
        FlockBackend::new(config.lock_path(), config.privilege_check).without_metadata(),
    );

    match guard.try_lock() {
        Ok(()) => {
            guard.unlock()?;
            Ok(LockState::Free)
        }
        Err(SnapLockError::AlreadyLocked) => Ok(LockState::Held),
        Err(SnapLockError::NeedsPrivilege) => Ok(LockState::Unknown),
        Err(e) => Err(e),
    }
}
