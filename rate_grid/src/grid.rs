//! Rectangular treatment grid anchored on a geographic centre point.
//!
//! The grid is generated by walking the spherical model from the centre to
//! the top-left corner (the *origin*) and then south/east one cell at a
//! time. Each cell edge is computed from the cell size rather than
//! interpolated, so a little eastward drift accumulates across wide grids.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RateGridError, Result};
use crate::geometry::{Bearing, Geodesic, Point, SphericalEarth};

/// Width and height of a single cell in metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

impl CellSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

/// Parameters of a generated grid.
///
/// `origin` is the top-left corner of the grid's bounding rectangle. It is
/// fixed when the grid is generated and every locator computation is
/// relative to it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridParams {
    pub origin: Point,
    pub cell_size: CellSize,
    pub rows: usize,
    pub cols: usize,
}

/// Treatment state of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    #[default]
    Unselected,
    Selected,
    Applied,
}

impl fmt::Display for CellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellStatus::Unselected => write!(f, "unselected"),
            CellStatus::Selected => write!(f, "selected"),
            CellStatus::Applied => write!(f, "applied"),
        }
    }
}

impl std::str::FromStr for CellStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unselected" => Ok(CellStatus::Unselected),
            "selected" => Ok(CellStatus::Selected),
            "applied" => Ok(CellStatus::Applied),
            other => Err(format!("unknown cell status '{other}'")),
        }
    }
}

/// Formats the `"{row}-{col}"` key used to identify cells and blocks.
pub fn cell_id(row: usize, col: usize) -> String {
    format!("{row}-{col}")
}

/// Parses a `"{row}-{col}"` key back into its indices.
pub fn parse_cell_id(id: &str) -> Option<(usize, usize)> {
    let (row, col) = id.split_once('-')?;
    Some((row.parse().ok()?, col.parse().ok()?))
}

/// One rectangular unit of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub id: String,
    pub row: usize,
    pub col: usize,
    /// Corners ordered top-left, top-right, bottom-right, bottom-left.
    pub coordinates: [Point; 4],
    /// Top-left and bottom-right corners.
    pub original_coordinates: [Point; 2],
    pub center: Point,
    pub status: CellStatus,
    pub target_rate: Option<u32>,
}

impl Cell {
    pub fn top_left(&self) -> Point {
        self.coordinates[0]
    }

    pub fn bottom_right(&self) -> Point {
        self.coordinates[2]
    }

    /// Axis-aligned containment test against the cell's corner extents.
    pub fn contains(&self, point: Point) -> bool {
        let [tl, tr, br, bl] = self.coordinates;
        let lat_min = br.latitude.min(bl.latitude);
        let lat_max = tl.latitude.max(tr.latitude);
        let lng_min = tl.longitude.min(bl.longitude);
        let lng_max = tr.longitude.max(br.longitude);
        (lat_min..=lat_max).contains(&point.latitude)
            && (lng_min..=lng_max).contains(&point.longitude)
    }

    /// Resets the cell to the untreated state.
    pub fn reset(&mut self) {
        self.status = CellStatus::Unselected;
        self.target_rate = None;
    }
}

/// Generates `rows * cols` cells around `center`.
///
/// Invalid parameters are reported by returning no cells and no
/// [`GridParams`] rather than an error, so callers can show their own
/// message. [`Grid::generate`] is the typed-error variant.
pub fn generate_grid(
    center: Point,
    cell_size: CellSize,
    rows: usize,
    cols: usize,
) -> (Vec<Cell>, Option<GridParams>) {
    generate_grid_with(&SphericalEarth, center, cell_size, rows, cols)
}

/// Same as [`generate_grid`] using a caller-supplied geodesic model.
pub fn generate_grid_with<G: Geodesic>(
    model: &G,
    center: Point,
    cell_size: CellSize,
    rows: usize,
    cols: usize,
) -> (Vec<Cell>, Option<GridParams>) {
    if rows == 0 || cols == 0 || !cell_size.is_valid() || !center.is_valid() {
        log::warn!(
            "Invalid grid parameters: {rows}x{cols} cells of {}x{} m at ({}, {})",
            cell_size.width,
            cell_size.height,
            center.latitude,
            center.longitude
        );
        return (Vec::new(), None);
    }

    let total_height = cell_size.height * rows as f64;
    let total_width = cell_size.width * cols as f64;
    let top_edge = model.destination(center, total_height / 2.0, Bearing::North);
    let origin = model.destination(top_edge, total_width / 2.0, Bearing::West);

    let mut cells = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        let row_origin = model.destination(origin, cell_size.height * row as f64, Bearing::South);
        for col in 0..cols {
            let top_left =
                model.destination(row_origin, cell_size.width * col as f64, Bearing::East);
            let top_right = model.destination(top_left, cell_size.width, Bearing::East);
            let bottom_left = model.destination(top_left, cell_size.height, Bearing::South);
            let bottom_right = model.destination(bottom_left, cell_size.width, Bearing::East);
            let mid_left = model.destination(top_left, cell_size.height / 2.0, Bearing::South);
            let center = model.destination(mid_left, cell_size.width / 2.0, Bearing::East);

            cells.push(Cell {
                id: cell_id(row, col),
                row,
                col,
                coordinates: [top_left, top_right, bottom_right, bottom_left],
                original_coordinates: [top_left, bottom_right],
                center,
                status: CellStatus::Unselected,
                target_rate: None,
            });
        }
    }

    log::info!(
        "Generated {rows}x{cols} grid with origin ({:.7}, {:.7})",
        origin.latitude,
        origin.longitude
    );
    let params = GridParams {
        origin,
        cell_size,
        rows,
        cols,
    };
    (cells, Some(params))
}

/// Navigation step between neighbouring cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Extents of a generated grid in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// A generated grid: its parameters plus the row-major cell list.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub params: GridParams,
    cells: Vec<Cell>,
}

impl Grid {
    /// Generates a grid, failing with [`RateGridError::InvalidGridParameters`].
    pub fn generate(center: Point, cell_size: CellSize, rows: usize, cols: usize) -> Result<Self> {
        match generate_grid(center, cell_size, rows, cols) {
            (cells, Some(params)) => Ok(Self { params, cells }),
            (_, None) => Err(RateGridError::InvalidGridParameters),
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell_at(&self, row: usize, col: usize) -> Option<&Cell> {
        if row >= self.params.rows || col >= self.params.cols {
            return None;
        }
        self.cells.get(row * self.params.cols + col)
    }

    fn index_of(&self, id: &str) -> Option<usize> {
        let (row, col) = parse_cell_id(id)?;
        if row >= self.params.rows || col >= self.params.cols {
            return None;
        }
        Some(row * self.params.cols + col)
    }

    pub fn cell(&self, id: &str) -> Option<&Cell> {
        self.index_of(id).and_then(|i| self.cells.get(i))
    }

    pub fn cell_mut(&mut self, id: &str) -> Option<&mut Cell> {
        let i = self.index_of(id)?;
        self.cells.get_mut(i)
    }

    pub(crate) fn cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut()
    }

    /// Returns the neighbour of `id` in `direction`, clamped at the edges.
    pub fn neighbor(&self, id: &str, direction: Direction) -> Option<&Cell> {
        let (row, col) = parse_cell_id(id)?;
        self.cell_at(row, col)?;
        let (row, col) = match direction {
            Direction::Up => (row.saturating_sub(1), col),
            Direction::Down => ((row + 1).min(self.params.rows - 1), col),
            Direction::Left => (row, col.saturating_sub(1)),
            Direction::Right => (row, (col + 1).min(self.params.cols - 1)),
        };
        self.cell_at(row, col)
    }

    pub fn bounds(&self) -> GridBounds {
        let mut bounds = GridBounds {
            north: f64::MIN,
            south: f64::MAX,
            east: f64::MIN,
            west: f64::MAX,
        };
        for cell in &self.cells {
            for p in &cell.coordinates {
                bounds.north = bounds.north.max(p.latitude);
                bounds.south = bounds.south.min(p.latitude);
                bounds.east = bounds.east.max(p.longitude);
                bounds.west = bounds.west.min(p.longitude);
            }
        }
        bounds
    }
}
