//! Core library for the variable-rate grid editor.
//!
//! Lays a geodesic grid of rectangular cells over a field, lets callers
//! place treatment blocks on cells, and moves block lists in and out of
//! part files, JSON backups and a persistent key-value store.

pub mod block;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod io;
pub mod settings;
pub mod snap;
pub mod state;
pub mod store;

pub use block::Block;
pub use error::{RateGridError, Result};
pub use geometry::Point;
pub use grid::{Cell, CellSize, CellStatus, Grid, GridParams};
pub use settings::GridSettings;
pub use state::EditorState;
