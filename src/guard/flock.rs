//! `flock(2)`-backed implementation of [`GuardBackend`].

use super::GuardBackend;
use super::metadata::LockMetadata;
use crate::config::PrivilegeCheck;
use crate::error::{Result, SnapLockError};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Advisory file lock on a well-known path.
///
/// A fresh file handle is opened on every acquire and closed on release, so a
/// handle is never reused across lock cycles. The OS drops the lock if the
/// process dies while holding it.
#[derive(Debug)]
pub struct FlockBackend {
    path: PathBuf,
    privilege: PrivilegeCheck,
    action: String,
    record_metadata: bool,
    file: Option<File>,
}

impl FlockBackend {
    /// Create a backend for the lock file at `path`.
    pub fn new(path: impl Into<PathBuf>, privilege: PrivilegeCheck) -> Self {
        Self {
            path: path.into(),
            privilege,
            action: "snaplock".to_string(),
            record_metadata: true,
            file: None,
        }
    }

    /// Action recorded in the holder metadata.
    pub fn with_action(mut self, action: &str) -> Self {
        self.action = action.to_string();
        self
    }

    /// Leave the lock file contents alone on acquire.
    ///
    /// Used by probes that should not overwrite the last holder's metadata.
    pub fn without_metadata(mut self) -> Self {
        self.record_metadata = false;
        self
    }

    fn open(&self) -> Result<File> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).map_err(|e| SnapLockError::lock_file(parent, e))?;
        }

        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|e| SnapLockError::lock_file(&self.path, e))
    }

    fn write_metadata(&self, file: &mut File) -> io::Result<()> {
        let meta = LockMetadata::new(&self.action);
        let json = meta.to_json().map_err(io::Error::other)?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(json.as_bytes())?;
        file.sync_data()
    }
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

impl GuardBackend for FlockBackend {
    fn is_admin(&self) -> bool {
        self.privilege.is_admin()
    }

    fn acquire(&mut self, blocking: bool) -> Result<()> {
        let mut file = self.open()?;

        let locked = if blocking {
            FileExt::lock_exclusive(&file)
        } else {
            FileExt::try_lock_exclusive(&file)
        };
        locked.map_err(|e| {
            if !blocking && is_contended(&e) {
                SnapLockError::AlreadyLocked
            } else {
                SnapLockError::lock_file(&self.path, e)
            }
        })?;

        if self.record_metadata
            && let Err(e) = self.write_metadata(&mut file)
        {
            tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "failed to record lock holder metadata"
            );
        }

        self.file = Some(file);
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        let file = self.file.take().ok_or(SnapLockError::NotLocked)?;
        FileExt::unlock(&file).map_err(|e| SnapLockError::lock_file(&self.path, e))
    }

    fn path(&self) -> &Path {
        &self.path
    }
}
