//! Spatial validation for space grids
//!
//! Pure cell-level checks: boundary containment, static obstacles, and
//! single-step adjacency. No occupant knowledge; live-occupant collisions
//! are checked by the room that owns them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A cell coordinate within a space grid.
///
/// Coordinates are signed so that arbitrary client input can be represented
/// and rejected by validation instead of failing to parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// True when `other` is one of the four orthogonal neighbors.
    /// Diagonals and multi-cell jumps have distance != 1 and fail.
    pub fn is_adjacent_step(&self, other: &Position) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }
}

/// Resolved metadata for one space: dimensions plus the cells blocked by
/// statically placed elements. Immutable for the lifetime of a joined room.
#[derive(Debug, Clone, Default)]
pub struct SpaceMetadata {
    pub width: u32,
    pub height: u32,
    pub static_cells: HashSet<Position>,
}

/// Occupiability checks for one space.
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    meta: SpaceMetadata,
}

impl SpatialGrid {
    pub fn new(meta: SpaceMetadata) -> Self {
        Self { meta }
    }

    pub fn width(&self) -> u32 {
        self.meta.width
    }

    pub fn height(&self) -> u32 {
        self.meta.height
    }

    /// Whether the cell lies within `[0,width) x [0,height)`.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && pos.x < i64::from(self.meta.width)
            && pos.y < i64::from(self.meta.height)
    }

    /// Whether the cell can hold an occupant: in bounds and not covered by
    /// a static element.
    pub fn can_occupy(&self, pos: Position) -> bool {
        self.in_bounds(pos) && !self.meta.static_cells.contains(&pos)
    }
}
