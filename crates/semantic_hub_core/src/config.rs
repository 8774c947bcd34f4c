//! Engine configuration.
//!
//! Resolution order for `from_env`: environment variable, then default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::HubError;

pub const STORE_TIMEOUT_ENV: &str = "SEMANTIC_HUB_STORE_TIMEOUT_MS";
pub const DEFAULT_PAGE_SIZE_ENV: &str = "SEMANTIC_HUB_DEFAULT_PAGE_SIZE";

/// Tunables for `LifecycleEngine` and `LookupService`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for a single store call (milliseconds).
    pub store_timeout_ms: u64,
    /// Page size used by `list` when the request carries none.
    pub default_page_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5_000,
            default_page_size: 10,
        }
    }
}

impl EngineConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn from_env() -> Result<Self, HubError> {
        let mut config = Self::default();
        if let Some(ms) = read_env::<u64>(STORE_TIMEOUT_ENV)? {
            config.store_timeout_ms = ms;
        }
        if let Some(size) = read_env::<usize>(DEFAULT_PAGE_SIZE_ENV)? {
            config.default_page_size = size;
        }
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document; missing keys take their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, HubError> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| HubError::InvalidInput(format!("engine config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), HubError> {
        if self.store_timeout_ms == 0 {
            return Err(HubError::InvalidInput(
                "store_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.default_page_size == 0 {
            return Err(HubError::InvalidInput(
                "default_page_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

fn read_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>, HubError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| HubError::InvalidInput(format!("{key}: cannot parse '{raw}'"))),
        Err(_) => Ok(None),
    }
}
