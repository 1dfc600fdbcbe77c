//! Resolves an arbitrary coordinate to the grid cell that contains it.
//!
//! The lookup is O(1) arithmetic rather than a point-in-polygon scan: the
//! north/south and east/west great-circle offsets from the grid origin are
//! divided by the cell size to give a row and column.
//!
//! Sign convention: the origin is the grid's *top-left* corner, so a point
//! is only inside the grid when it lies south of the origin latitude and
//! east of the origin longitude. Offsets to the north or west are negative
//! and therefore fall outside `0..rows` / `0..cols`. Inverting either test
//! silently mirrors the grid.
//!
//! Earlier releases negated the truncated unsigned offset instead, so the
//! first cell-width band north of the top edge (and west of the left edge)
//! truncated to `-0` and resolved to row or column 0. Flooring the signed
//! offset reports that band as outside the grid.
//!
//! Non-finite or out-of-range coordinates never resolve to a cell.

use crate::error::{RateGridError, Result};
use crate::geometry::{Geodesic, Point, SphericalEarth};
use crate::grid::{cell_id, Cell, Grid, GridParams};

/// Computes the signed `(row, col)` of a point relative to the grid origin.
pub fn row_col_with<G: Geodesic>(model: &G, lat: f64, lng: f64, params: &GridParams) -> (i64, i64) {
    let origin = params.origin;
    let north_south = model.distance(origin, Point::new(lat, origin.longitude));
    let east_west = model.distance(origin, Point::new(origin.latitude, lng));

    // South and east offsets are positive, north and west negative. Flooring
    // the signed offset keeps the whole band north of the top edge (and west
    // of the left edge) outside the grid, including the first cell's width.
    let north_south = if lat < origin.latitude { north_south } else { -north_south };
    let east_west = if lng > origin.longitude { east_west } else { -east_west };

    let row = (north_south / params.cell_size.height).floor() as i64;
    let col = (east_west / params.cell_size.width).floor() as i64;
    (row, col)
}

/// Returns the `"{row}-{col}"` id of the cell holding the point, if any.
pub fn snap_to_cell_id(lat: f64, lng: f64, params: &GridParams) -> Option<String> {
    if !Point::new(lat, lng).is_valid() {
        return None;
    }
    let (row, col) = row_col_with(&SphericalEarth, lat, lng, params);
    let in_rows = (0..params.rows as i64).contains(&row);
    let in_cols = (0..params.cols as i64).contains(&col);
    if in_rows && in_cols {
        Some(cell_id(row as usize, col as usize))
    } else {
        None
    }
}

/// Finds the cell holding `(lat, lng)` in `cells`, or `None` when the point
/// is outside the grid.
pub fn snap_to_cell<'a>(lat: f64, lng: f64, params: &GridParams, cells: &'a [Cell]) -> Option<&'a Cell> {
    let id = snap_to_cell_id(lat, lng, params)?;
    let (row, col) = crate::grid::parse_cell_id(&id)?;
    // Row-major cells can be indexed directly; fall back to a scan otherwise.
    match cells.get(row * params.cols + col) {
        Some(cell) if cell.id == id => Some(cell),
        _ => cells.iter().find(|c| c.id == id),
    }
}

impl Grid {
    /// Snaps a coordinate to its containing cell.
    pub fn locate(&self, lat: f64, lng: f64) -> Option<&Cell> {
        snap_to_cell(lat, lng, &self.params, self.cells())
    }

    /// Like [`Grid::locate`] but reports a miss as
    /// [`RateGridError::NoCellAtLocation`].
    pub fn locate_checked(&self, lat: f64, lng: f64) -> Result<&Cell> {
        self.locate(lat, lng).ok_or_else(|| {
            log::warn!("No grid cell found at ({lat}, {lng})");
            RateGridError::NoCellAtLocation { lat, lng }
        })
    }
}
