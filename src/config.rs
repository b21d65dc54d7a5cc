//! Configuration management
//!
//! `config.toml` lives in the platform config directory
//! (`$XDG_CONFIG_HOME/matrix-link` on Linux), or wherever `--config` points.
//! The state document defaults to `state.json` next to it.

use crate::constants::{DEFAULT_LOG_CAPACITY, SERIAL_BAUD_RATE, UDP_LOCAL_PORT};
use crate::error::{MatrixError, Result};
use crate::sender::SenderOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

const APP_DIR: &str = "matrix-link";
const CONFIG_FILE: &str = "config.toml";
const STATE_FILE: &str = "state.json";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transport: TransportConfig,
    pub state: StateConfig,
    pub logs: LogsConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Local port every UDP datagram is sent from
    pub udp_local_port: u16,
    /// Serial baud rate (the switcher expects 9600)
    pub serial_baud_rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// State document path (default: `state.json` next to the config file)
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Maximum activity log entries in memory
    pub max_entries: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            udp_local_port: UDP_LOCAL_PORT,
            serial_baud_rate: SERIAL_BAUD_RATE,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_LOG_CAPACITY,
        }
    }
}

impl Config {
    pub fn sender_options(&self) -> SenderOptions {
        SenderOptions {
            udp_local_port: self.transport.udp_local_port,
            serial_baud_rate: self.transport.serial_baud_rate,
        }
    }

    /// State document path, relative paths resolved against the config file
    pub fn state_path(&self, config_path: &Path) -> PathBuf {
        let dir = config_path.parent().unwrap_or_else(|| Path::new("."));
        match &self.state.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => dir.join(path),
            None => dir.join(STATE_FILE),
        }
    }
}

/// Platform config directory for the application
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or_else(|| MatrixError::ConfigValidation {
            field: "config_dir",
            reason: "no config directory on this platform".into(),
        })
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Load config from file, or create default if not exists
pub fn load(path: &Path) -> Config {
    if !path.exists() {
        let config = Config::default();
        if let Err(e) = save(&config, path) {
            warn!("Failed to create default config: {}", e);
        }
        return config;
    }

    match fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Config parse error in {:?}: {}, using defaults", path, e);
                Config::default()
            }
        },
        Err(e) => {
            warn!("Failed to read config {:?}: {}, using defaults", path, e);
            Config::default()
        }
    }
}

/// Save config to file
pub fn save(config: &Config, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config).map_err(|e| MatrixError::Encode {
        what: "config",
        reason: e.to_string(),
    })?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| MatrixError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, content).map_err(|source| MatrixError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Tests
// ============================================================================
