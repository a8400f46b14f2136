//! Executor configuration and the settings file that feeds it.

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ExecuteError;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 6] = [408, 429, 500, 502, 503, 504];
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 1;

/// Per-call execution policy. Never stored by the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retryable_status_codes: BTreeSet<u16>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_retries: DEFAULT_MAX_RETRIES,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.into_iter().collect(),
        }
    }
}

impl ExecutorConfig {
    pub fn with_timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = codes.into_iter().collect();
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }

    pub fn validate(&self) -> Result<(), ExecuteError> {
        if self.timeout_seconds == 0 {
            return Err(ExecuteError::InvalidConfig(
                "timeout_seconds must be positive".to_string(),
            ));
        }
        if let Some(code) = self
            .retryable_status_codes
            .iter()
            .find(|code| !(400..=599).contains(*code))
        {
            return Err(ExecuteError::InvalidConfig(format!(
                "retryable status {} is not an HTTP error status",
                code
            )));
        }
        Ok(())
    }
}

/// Everything the settings file can hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(flatten)]
    pub executor: ExecutorConfig,
    pub concurrency_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            executor: ExecutorConfig::default(),
            concurrency_limit: DEFAULT_CONCURRENCY_LIMIT,
        }
    }
}

impl Settings {
    /// Default settings file location: `<config_dir>/httpexec/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("httpexec").join("config.json"))
    }

    /// Loads settings from `path`, or from [`Settings::default_path`] when it
    /// exists. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::read(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path),
                _ => {
                    debug!("No settings file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    fn read(path: &Path) -> Result<Self> {
        debug!("Loading settings from {:?}", path);
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {:?}", path))?;
        let settings: Settings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file {:?}", path))?;
        settings
            .executor
            .validate()
            .with_context(|| format!("Invalid settings in {:?}", path))?;
        Ok(settings)
    }
}
