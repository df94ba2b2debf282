//! Config loading, validation, and path resolution.

use super::model::Config;
use super::types::{LOCK_FILE_NAME, RUN_DIR};
use crate::error::{Result, SnapLockError};
use crate::guard::RetryPolicy;
use std::path::{Path, PathBuf};
use std::time::Duration;

impl Config {
    /// Load config from a YAML file.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    ///
    /// # Returns
    ///
    /// * `Ok(Config)` - Successfully loaded and validated config
    /// * `Err(SnapLockError::UserError)` - Read error, parse error or validation failure
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            SnapLockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Load config from `path` if the file exists, otherwise use defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse config from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml rejects an empty document for a struct; treat it as all defaults.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(yaml).map_err(|e| {
            SnapLockError::UserError(format!("failed to parse config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Serialize config to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| {
            SnapLockError::UserError(format!("failed to serialize config to YAML: {}", e))
        })
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `retry_wait_seconds` must be positive
    /// - `lock_file_path`, when set, must be non-empty
    pub fn validate(&self) -> Result<()> {
        if self.retry_wait_seconds == 0 {
            return Err(SnapLockError::UserError(
                "config validation failed: retry_wait_seconds must be greater than 0".to_string(),
            ));
        }

        if let Some(path) = &self.lock_file_path
            && path.as_os_str().is_empty()
        {
            return Err(SnapLockError::UserError(
                "config validation failed: lock_file_path must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Path of the process-wide lock file.
    pub fn lock_path(&self) -> PathBuf {
        match &self.lock_file_path {
            Some(path) => path.clone(),
            None => self.root_dir.join(RUN_DIR).join(LOCK_FILE_NAME),
        }
    }

    /// Retry behaviour for contended `try_lock` callers.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            wait: Duration::from_secs(self.retry_wait_seconds),
            max_retries: self.max_retries,
        }
    }
}
