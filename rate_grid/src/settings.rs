//! User-facing grid configuration.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geometry::Point;
use crate::grid::{CellSize, Grid};

/// Number of rows and columns in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDimensions {
    pub rows: usize,
    pub cols: usize,
}

/// Settings a grid is generated from.
///
/// Persisted between sessions under the `gridSettings` key and optionally
/// saved to a standalone JSON file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridSettings {
    pub grid_center: Point,
    pub cell_size: CellSize,
    pub grid_dimensions: GridDimensions,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            grid_center: Point::new(-27.945563, 25.661019),
            cell_size: CellSize::new(100.0, 100.0),
            grid_dimensions: GridDimensions { rows: 10, cols: 10 },
        }
    }
}

impl GridSettings {
    pub fn new(center: Point, cell_size: CellSize, rows: usize, cols: usize) -> Self {
        Self {
            grid_center: center,
            cell_size,
            grid_dimensions: GridDimensions { rows, cols },
        }
    }

    /// Generates the grid these settings describe.
    pub fn generate(&self) -> Result<Grid> {
        Grid::generate(
            self.grid_center,
            self.cell_size,
            self.grid_dimensions.rows,
            self.grid_dimensions.cols,
        )
    }

    /// Saves the settings to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        crate::io::write_string(path, &json)?;
        Ok(())
    }

    /// Loads settings from a JSON file.
    pub fn load(path: &str) -> Result<Self> {
        let data = crate::io::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }
}
