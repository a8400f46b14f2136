use anyhow::{Context, Result};
use log::debug;
use std::path::Path;

use crate::{
    config::Settings,
    executor::RequestExecutor,
    transport::{ReqwestTransport, Transport},
};

/// Values given on the command line or through the environment. They win
/// over the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    pub retryable_status_codes: Option<Vec<u16>>,
    pub concurrency_limit: Option<usize>,
}

impl Overrides {
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(timeout_seconds) = self.timeout_seconds {
            settings.executor.timeout_seconds = timeout_seconds;
        }
        if let Some(max_retries) = self.max_retries {
            settings.executor.max_retries = max_retries;
        }
        if let Some(codes) = &self.retryable_status_codes {
            settings.executor.retryable_status_codes = codes.iter().copied().collect();
        }
        if let Some(limit) = self.concurrency_limit {
            settings.concurrency_limit = limit;
        }
        settings
    }
}

/// Settings file, then overrides, validated.
pub fn resolve_settings(config_path: Option<&Path>, overrides: &Overrides) -> Result<Settings> {
    let settings = overrides.apply(Settings::load(config_path)?);
    settings
        .executor
        .validate()
        .context("Invalid executor configuration")?;
    debug!("Resolved settings: {:?}", settings);
    Ok(settings)
}

pub struct Config<T: Transport> {
    pub executor: RequestExecutor<T>,
    pub settings: Settings,
}

impl Config<ReqwestTransport> {
    pub fn new(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let settings = resolve_settings(config_path, overrides)?;
        let transport = ReqwestTransport::with_default_client()?;
        Ok(Self::with_transport(transport, settings))
    }
}

impl<T: Transport + 'static> Config<T> {
    pub fn with_transport(transport: T, settings: Settings) -> Self {
        Self {
            executor: RequestExecutor::new(transport),
            settings,
        }
    }
}
