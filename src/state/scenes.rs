//! Switch history and scenes

use crate::constants::{SCENE_ID_MAX, SCENE_ID_MIN};
use crate::error::{MatrixError, Result};
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One routing instruction as it was sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRecord {
    #[serde(alias = "input")]
    pub input_id: u8,
    #[serde(alias = "outputs")]
    pub output_ids: BTreeSet<u8>,
    #[serde(alias = "cmd")]
    pub command_text: String,
}

impl SwitchRecord {
    pub fn is_switch_all(&self) -> bool {
        self.command_text.ends_with("TOALL")
    }

    /// `3->1,2,5` or `3->TOALL`
    pub fn summary(&self) -> String {
        if self.is_switch_all() {
            return format!("{}->TOALL", self.input_id);
        }
        let outputs: Vec<String> = self.output_ids.iter().map(|o| o.to_string()).collect();
        format!("{}->{}", self.input_id, outputs.join(","))
    }
}

/// Pending switches since the last scene save
///
/// At most one record per input. A newer switch for an input replaces the
/// old record in place, so the history keeps first-seen input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchHistory {
    records: Vec<SwitchRecord>,
}

impl SwitchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: SwitchRecord) {
        match self
            .records
            .iter_mut()
            .find(|r| r.input_id == record.input_id)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn records(&self) -> &[SwitchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// A named snapshot of switch records, recallable with `CALL<id>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: u8,
    pub name: String,
    pub records: Vec<SwitchRecord>,
    /// Unix time in milliseconds
    #[serde(alias = "timestamp")]
    pub created_at: i64,
}

impl Scene {
    pub fn path_summary(&self) -> String {
        self.records
            .iter()
            .map(SwitchRecord::summary)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Creation time in local time, `YYYY-MM-DD HH:MM:SS`
    pub fn created_display(&self) -> String {
        Local
            .timestamp_millis_opt(self.created_at)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

pub fn validate_scene_id(id: u8) -> Result<()> {
    if !(SCENE_ID_MIN..=SCENE_ID_MAX).contains(&id) {
        return Err(MatrixError::ConfigValidation {
            field: "scene id",
            reason: format!("{} is outside {}..={}", id, SCENE_ID_MIN, SCENE_ID_MAX),
        });
    }
    Ok(())
}

/// Insert or overwrite by id, keeping the list sorted by id
pub fn upsert(scenes: &mut Vec<Scene>, scene: Scene) {
    match scenes.binary_search_by_key(&scene.id, |s| s.id) {
        Ok(index) => scenes[index] = scene,
        Err(index) => scenes.insert(index, scene),
    }
}

/// Lowest unused id, or the first id when every slot is taken
pub fn next_free_id(scenes: &[Scene]) -> u8 {
    (SCENE_ID_MIN..=SCENE_ID_MAX)
        .find(|id| !scenes.iter().any(|s| s.id == *id))
        .unwrap_or(SCENE_ID_MIN)
}

/// Name used when the user leaves it blank
pub fn default_name(id: u8) -> String {
    format!("Scene {}", id)
}

// ============================================================================
// Tests
// ============================================================================
