//! User configuration (`<config_dir>/timerdeck/config.json`)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bridge::DEFAULT_POLL_INTERVAL;
use crate::host::client::default_socket_path;
use crate::session::RemoveMissing;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Host socket to connect to
    pub socket_path: PathBuf,
    /// How often to look for the host while it is not ready
    pub poll_interval_ms: u64,
    /// Give up waiting for the host after this long (unset = wait forever)
    pub bridge_timeout_ms: Option<u64>,
    /// How a remove of an unknown timer is reported
    pub remove_missing: RemoveMissing,
    /// Directory for `timerdeck.log`
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            bridge_timeout_ms: None,
            remove_missing: RemoveMissing::default(),
            log_dir: data_dir(),
        }
    }
}

impl Config {
    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {:?}", path))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config at {:?}", path))?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn bridge_timeout(&self) -> Option<Duration> {
        self.bridge_timeout_ms.map(Duration::from_millis)
    }
}

/// Default config file location
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timerdeck")
        .join("config.json")
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("timerdeck")
}
