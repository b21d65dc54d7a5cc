//! Splice geometry
//!
//! Tiles are numbered from 1, row-major: with `cols = 5`, tile 6 sits at
//! row 1, col 0. A selection can be spliced only if it covers exactly one
//! axis-aligned rectangle of the grid.

use std::collections::BTreeSet;

/// Zero-based `(row, col)` of a 1-based tile id
pub fn tile_position(id: u8, cols: u8) -> (u8, u8) {
    let index = id - 1;
    (index / cols, index % cols)
}

fn tile_id(row: u8, col: u8, cols: u8) -> u16 {
    u16::from(row) * u16::from(cols) + u16::from(col) + 1
}

/// True iff `selected` fills its own bounding box
///
/// Both the cell count and the presence of every cell inside the box are
/// checked. Empty and single-tile selections are rectangles.
pub fn is_rectangle(selected: &BTreeSet<u8>, cols: u8) -> bool {
    if cols == 0 || selected.contains(&0) {
        return false;
    }
    if selected.len() <= 1 {
        return true;
    }

    let positions: Vec<(u8, u8)> = selected.iter().map(|&id| tile_position(id, cols)).collect();
    let (mut min_row, mut max_row) = (u8::MAX, 0);
    let (mut min_col, mut max_col) = (u8::MAX, 0);
    for &(row, col) in &positions {
        min_row = min_row.min(row);
        max_row = max_row.max(row);
        min_col = min_col.min(col);
        max_col = max_col.max(col);
    }

    let area = usize::from(max_row - min_row + 1) * usize::from(max_col - min_col + 1);
    if area != selected.len() {
        return false;
    }

    (min_row..=max_row).all(|row| {
        (min_col..=max_col).all(|col| {
            u8::try_from(tile_id(row, col, cols))
                .map(|id| selected.contains(&id))
                .unwrap_or(false)
        })
    })
}

// =============================================================================
// Borders
// =============================================================================

/// Side of a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Right, Edge::Bottom, Edge::Left];
}

/// Internal edges face a tile of the same group; external edges are
/// drawn as the group boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Internal,
    External,
}

/// Edge classification of one tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBorders {
    pub top: EdgeKind,
    pub right: EdgeKind,
    pub bottom: EdgeKind,
    pub left: EdgeKind,
}

impl TileBorders {
    pub const ALL_EXTERNAL: TileBorders = TileBorders {
        top: EdgeKind::External,
        right: EdgeKind::External,
        bottom: EdgeKind::External,
        left: EdgeKind::External,
    };

    pub fn get(&self, edge: Edge) -> EdgeKind {
        match edge {
            Edge::Top => self.top,
            Edge::Right => self.right,
            Edge::Bottom => self.bottom,
            Edge::Left => self.left,
        }
    }

    pub fn external_edges(&self) -> Vec<Edge> {
        Edge::ALL
            .into_iter()
            .filter(|e| self.get(*e) == EdgeKind::External)
            .collect()
    }
}

/// Classify the four edges of `id` within `group` on a `rows` x `cols` grid
///
/// A neighbor outside the grid always yields an external edge, so tiles on
/// the right edge never "see" the first tile of the next row.
pub fn tile_borders(id: u8, group: &BTreeSet<u8>, rows: u8, cols: u8) -> TileBorders {
    if cols == 0 || id == 0 || !group.contains(&id) {
        return TileBorders::ALL_EXTERNAL;
    }

    let (row, col) = tile_position(id, cols);
    let classify = |neighbor: Option<(u8, u8)>| match neighbor {
        Some((r, c)) if r < rows && c < cols => {
            let internal = u8::try_from(tile_id(r, c, cols))
                .map(|n| group.contains(&n))
                .unwrap_or(false);
            if internal {
                EdgeKind::Internal
            } else {
                EdgeKind::External
            }
        }
        _ => EdgeKind::External,
    };

    TileBorders {
        top: classify(row.checked_sub(1).map(|r| (r, col))),
        right: classify(col.checked_add(1).map(|c| (row, c))),
        bottom: classify(row.checked_add(1).map(|r| (r, col))),
        left: classify(col.checked_sub(1).map(|c| (row, c))),
    }
}

// ============================================================================
// Tests
// ============================================================================
