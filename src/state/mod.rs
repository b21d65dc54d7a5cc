//! Persisted application state
//!
//! One JSON document holds every entity: channels, scenes, hardware and
//! power settings, the splicing layout and groups, and the connection
//! registry. The document is loaded once and written back wholesale after
//! every mutation.
//!
//! Older documents are accepted as they are: missing fields take their
//! defaults, and a legacy single `ip`/`port` pair is migrated into the
//! per-transport address fields.

pub mod connection;
pub mod hardware;
pub mod scenes;
pub mod splicing;

pub use connection::{
    set_ip_segment, validate_ip, validate_ip_segment, validate_port, ConnectionPatch,
    ConnectionRegistry, ConnectionSettings, MemoryRegistry,
};
pub use hardware::{default_channels, Channel, HardwareSettings, PowerSettings};
pub use scenes::{Scene, SwitchHistory, SwitchRecord};
pub use splicing::{SplicingGroup, SplicingSettings};

use crate::constants::{
    DEFAULT_CHANNEL_COUNT, DEFAULT_DEVICE_PORT, DEFAULT_TCP_IP, DEFAULT_UDP_IP, MAX_INPUTS,
    MAX_OUTPUTS,
};
use crate::error::{MatrixError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The whole persisted document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppState {
    pub input_channels: Vec<Channel>,
    pub output_channels: Vec<Channel>,
    /// Channels shown and targeted by switch-to-all
    pub channel_count: u8,
    pub scenes: Vec<Scene>,
    pub hardware_settings: HardwareSettings,
    pub splicing_settings: SplicingSettings,
    pub splicing_groups: Vec<SplicingGroup>,
    pub power_settings: PowerSettings,
    pub connection_settings: ConnectionSettings,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            input_channels: default_channels("Input", MAX_INPUTS),
            output_channels: default_channels("Output", MAX_OUTPUTS),
            channel_count: DEFAULT_CHANNEL_COUNT,
            scenes: Vec::new(),
            hardware_settings: HardwareSettings::default(),
            splicing_settings: SplicingSettings::default(),
            splicing_groups: Vec::new(),
            power_settings: PowerSettings::default(),
            connection_settings: ConnectionSettings::default(),
        }
    }
}

impl AppState {
    /// Parse a document, migrating legacy connection fields first
    pub fn from_json(text: &str) -> std::result::Result<Self, serde_json::Error> {
        let mut value: Value = serde_json::from_str(text)?;
        migrate_connection(&mut value);
        let mut state: Self = serde_json::from_value(value)?;
        state.reset_invalid_layout();
        Ok(state)
    }

    /// An out-of-range grid falls back to the default and drops its groups
    fn reset_invalid_layout(&mut self) {
        if self.splicing_settings.is_valid() {
            return;
        }
        warn!(
            rows = self.splicing_settings.rows,
            cols = self.splicing_settings.cols,
            "Invalid splicing layout in state document, using defaults"
        );
        self.splicing_settings = SplicingSettings::default();
        self.splicing_groups.clear();
    }
}

/// Fill `udpIp/udpPort/tcpIp/tcpPort` from the legacy `ip`/`port` pair
///
/// The legacy pair only belongs to the transport recorded as active; the
/// other transport gets its defaults.
fn migrate_connection(document: &mut Value) {
    let Some(connection) = document
        .get_mut("connectionSettings")
        .and_then(Value::as_object_mut)
    else {
        return;
    };

    let legacy_type = connection
        .get("activeType")
        .or_else(|| connection.get("type"))
        .and_then(Value::as_str)
        .map(str::to_string);
    let legacy_ip = connection.get("ip").cloned();
    let legacy_port = connection.get("port").cloned();

    for (kind, ip_key, port_key, default_ip) in [
        ("UDP", "udpIp", "udpPort", DEFAULT_UDP_IP),
        ("TCP", "tcpIp", "tcpPort", DEFAULT_TCP_IP),
    ] {
        let owns_legacy = legacy_type.as_deref() == Some(kind);
        if !connection.contains_key(ip_key) {
            let ip = legacy_ip
                .clone()
                .filter(|_| owns_legacy)
                .unwrap_or_else(|| Value::from(default_ip));
            connection.insert(ip_key.to_string(), ip);
        }
        if !connection.contains_key(port_key) {
            let port = legacy_port
                .clone()
                .filter(|_| owns_legacy)
                .unwrap_or_else(|| Value::from(DEFAULT_DEVICE_PORT));
            connection.insert(port_key.to_string(), port);
        }
    }
}

// =============================================================================
// Store
// =============================================================================

/// State document bound to its file
///
/// Mutations run on a copy; the copy is written to disk and only then
/// replaces the in-memory state, so a failed save leaves both untouched.
#[derive(Debug)]
pub struct Store {
    path: Option<PathBuf>,
    state: AppState,
}

impl Store {
    /// Load the document at `path`; missing or unparsable files yield defaults
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match fs::read_to_string(&path) {
            Ok(text) => match AppState::from_json(&text) {
                Ok(state) => state,
                Err(e) => {
                    warn!("State parse error in {:?}: {}, using defaults", path, e);
                    AppState::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No state file yet");
                AppState::default()
            }
            Err(source) => return Err(MatrixError::Io { path, source }),
        };

        Ok(Self {
            path: Some(path),
            state,
        })
    }

    /// In-memory store that never touches the disk
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            state: AppState::default(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Mutate and persist; the change is discarded if `f` or the save fails
    pub fn update<T>(&mut self, f: impl FnOnce(&mut AppState) -> Result<T>) -> Result<T> {
        let mut next = self.state.clone();
        let out = f(&mut next)?;
        self.write(&next)?;
        self.state = next;
        Ok(out)
    }

    fn write(&self, state: &AppState) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let content = serde_json::to_string_pretty(state).map_err(|e| MatrixError::Encode {
            what: "state",
            reason: e.to_string(),
        })?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|source| MatrixError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
        }

        // Write-then-rename so a crash never leaves a truncated document
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).map_err(|source| MatrixError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, path).map_err(|source| MatrixError::Io {
            path: path.clone(),
            source,
        })
    }
}

impl ConnectionRegistry for Store {
    fn get(&self) -> ConnectionSettings {
        self.state.connection_settings.clone()
    }

    fn update(&mut self, patch: ConnectionPatch) -> Result<ConnectionSettings> {
        Store::update(self, |state| {
            state.connection_settings.apply(patch)?;
            Ok(state.connection_settings.clone())
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
