//! Hardware toggles, power commands and channel labels

use crate::codec::{hex, Resolution};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Last values successfully sent to the switcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HardwareSettings {
    pub osd_enabled: bool,
    pub buzzer_enabled: bool,
    pub resolution: Resolution,
}

/// User-entered hex commands for the power relay
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PowerSettings {
    pub on_command: String,
    pub off_command: String,
}

impl PowerSettings {
    /// Both commands must decode as hex; empty leaves power control unset
    pub fn new(on_command: &str, off_command: &str) -> Result<Self> {
        for command in [on_command, off_command] {
            if !command.trim().is_empty() {
                hex::validate(command)?;
            }
        }
        Ok(Self {
            on_command: on_command.trim().to_string(),
            off_command: off_command.trim().to_string(),
        })
    }

    pub fn command(&self, on: bool) -> Option<&str> {
        let command = if on { &self.on_command } else { &self.off_command };
        Some(command.as_str()).filter(|c| !c.is_empty())
    }
}

/// A labelled input or output channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: u8,
    pub label: String,
}

/// `Input 1..=count` or `Output 1..=count`
pub fn default_channels(prefix: &str, count: u8) -> Vec<Channel> {
    (1..=count)
        .map(|id| Channel {
            id,
            label: format!("{} {}", prefix, id),
        })
        .collect()
}
