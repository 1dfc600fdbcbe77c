//! Treatment blocks: a target rate bound to exactly one grid cell.

use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::grid::Cell;

/// A user-authored treatment-rate assignment.
///
/// `id` is the owning cell's id. The geometry is copied from the cell when
/// the block is created and never recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: String,
    pub target_rate: u32,
    pub coordinates: Vec<Point>,
    pub original_coordinates: Vec<Point>,
}

impl Block {
    /// Creates a block for `cell` with the given rate.
    pub fn for_cell(cell: &Cell, target_rate: u32) -> Self {
        Self {
            id: cell.id.clone(),
            target_rate,
            coordinates: cell.coordinates.to_vec(),
            original_coordinates: cell.original_coordinates.to_vec(),
        }
    }

    /// Returns `true` when the block carries enough geometry to be written
    /// to a part file.
    pub fn has_complete_geometry(&self) -> bool {
        self.coordinates.len() >= 4 && self.original_coordinates.len() >= 2
    }

    /// Centre of the stored top-left/bottom-right diagonal, used to re-snap
    /// imported blocks into a live grid.
    pub fn anchor(&self) -> Option<Point> {
        match self.original_coordinates.as_slice() {
            [a, b, ..] => Some(Point::midpoint(*a, *b)),
            _ => None,
        }
    }
}
