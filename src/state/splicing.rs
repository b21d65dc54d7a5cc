//! Splicing layout and groups

use crate::constants::{DEFAULT_GRID_COLS, DEFAULT_GRID_ROWS, GRID_MAX, GRID_MIN};
use crate::error::{MatrixError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Grid of output tiles, `rows` x `cols`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplicingSettings {
    pub rows: u8,
    pub cols: u8,
}

impl Default for SplicingSettings {
    fn default() -> Self {
        Self {
            rows: DEFAULT_GRID_ROWS,
            cols: DEFAULT_GRID_COLS,
        }
    }
}

impl SplicingSettings {
    pub fn new(rows: u8, cols: u8) -> Result<Self> {
        validate_dimension("rows", rows)?;
        validate_dimension("cols", cols)?;
        Ok(Self { rows, cols })
    }

    pub fn tile_count(&self) -> u16 {
        u16::from(self.rows) * u16::from(self.cols)
    }

    /// Id of the bottom-right tile
    pub fn last_tile(&self) -> u8 {
        self.rows.saturating_mul(self.cols)
    }

    pub fn contains(&self, tile: u8) -> bool {
        (1..=self.tile_count()).contains(&u16::from(tile))
    }

    /// Both dimensions inside the supported range
    pub fn is_valid(&self) -> bool {
        validate_dimension("rows", self.rows).is_ok()
            && validate_dimension("cols", self.cols).is_ok()
    }
}

fn validate_dimension(field: &'static str, value: u8) -> Result<()> {
    if !(GRID_MIN..=GRID_MAX).contains(&value) {
        return Err(MatrixError::ConfigValidation {
            field,
            reason: format!("{} is outside {}..={}", value, GRID_MIN, GRID_MAX),
        });
    }
    Ok(())
}

/// Tiles merged into one combined screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplicingGroup {
    #[serde(alias = "id")]
    pub group_id: u64,
    pub output_ids: BTreeSet<u8>,
}

impl SplicingGroup {
    pub fn first(&self) -> Option<u8> {
        self.output_ids.first().copied()
    }

    pub fn last(&self) -> Option<u8> {
        self.output_ids.last().copied()
    }
}

/// Group owning `tile`, if any
pub fn group_of(groups: &[SplicingGroup], tile: u8) -> Option<&SplicingGroup> {
    groups.iter().find(|g| g.output_ids.contains(&tile))
}

/// Fresh group id from a millisecond timestamp, bumped past any collision
pub fn new_group_id(groups: &[SplicingGroup], now_ms: i64) -> u64 {
    let mut id = u64::try_from(now_ms).unwrap_or_default();
    while groups.iter().any(|g| g.group_id == id) {
        id += 1;
    }
    id
}
