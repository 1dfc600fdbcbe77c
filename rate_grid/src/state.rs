//! Editing session state: the grid, its cells and the blocks placed on them.
//!
//! All mutations go through [`EditorState`] methods. Each one validates
//! before touching anything, so a failed call leaves the state exactly as it
//! was. After every successful call a cell carries a target rate if and only
//! if its status is not `unselected`, and every block owns an existing cell.

use std::collections::{BTreeMap, HashSet};

use crate::block::Block;
use crate::error::{RateGridError, Result};
use crate::grid::{Cell, CellStatus, Direction, Grid};
use crate::io::part::PartRecord;
use crate::settings::GridSettings;
use crate::store::KeyValueStore;

/// Store key for the serialized [`GridSettings`].
pub const SETTINGS_KEY: &str = "gridSettings";
/// Store key for the serialized block list.
pub const BLOCKS_KEY: &str = "blocks";
/// Store key for the status of every treated cell, keyed by cell id.
pub const CELL_STATUS_KEY: &str = "cellStatus";

/// A grid regeneration computed but not yet applied.
#[derive(Debug, Clone)]
pub struct GridChangeProposal {
    pub settings: GridSettings,
    pub grid: Grid,
    /// Number of blocks that committing would discard.
    pub discarded_blocks: usize,
}

/// Outcome of replacing the block list from an external source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// The single owner of grid and block state for one editing session.
#[derive(Debug, Clone, Default)]
pub struct EditorState {
    settings: GridSettings,
    grid: Option<Grid>,
    blocks: Vec<Block>,
    current_cell: Option<String>,
    selected_block: Option<String>,
    selected_cells: Vec<String>,
}

fn check_rate(rate: u32) -> Result<()> {
    if rate == 0 {
        return Err(RateGridError::TargetRateOutOfRange(rate));
    }
    Ok(())
}

fn mark_cell(cell: &mut Cell, status: CellStatus, rate: Option<u32>) {
    match status {
        CellStatus::Unselected => cell.reset(),
        _ => {
            cell.status = status;
            cell.target_rate = rate;
        }
    }
}

impl EditorState {
    /// Creates a session without a grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session and generates the grid described by `settings`.
    pub fn with_settings(settings: GridSettings) -> Result<Self> {
        let grid = settings.generate()?;
        Ok(Self {
            settings,
            grid: Some(grid),
            ..Self::default()
        })
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Places a block on the cell containing `(lat, lng)`.
    pub fn add_block(&mut self, lat: f64, lng: f64, target_rate: u32) -> Result<&Block> {
        check_rate(target_rate)?;
        let grid = self.grid.as_mut().ok_or(RateGridError::GridNotReady)?;
        let block = {
            let cell = grid.locate_checked(lat, lng)?;
            if self.blocks.iter().any(|b| b.id == cell.id) {
                log::warn!("Block already exists at cell {}", cell.id);
                return Err(RateGridError::DuplicateBlock(cell.id.clone()));
            }
            Block::for_cell(cell, target_rate)
        };
        if let Some(cell) = grid.cell_mut(&block.id) {
            mark_cell(cell, CellStatus::Selected, Some(target_rate));
        }
        log::debug!("Added block {} with rate {target_rate}", block.id);
        self.blocks.push(block);
        Ok(&self.blocks[self.blocks.len() - 1])
    }

    /// Replaces the block with the same id and re-selects its cell.
    pub fn update_block(&mut self, block: Block) -> Result<()> {
        check_rate(block.target_rate)?;
        let index = self
            .blocks
            .iter()
            .position(|b| b.id == block.id)
            .ok_or_else(|| RateGridError::BlockNotFound(block.id.clone()))?;
        let grid = self.grid.as_mut().ok_or(RateGridError::GridNotReady)?;
        let cell = grid
            .cell_mut(&block.id)
            .ok_or_else(|| RateGridError::UnknownCell(block.id.clone()))?;
        mark_cell(cell, CellStatus::Selected, Some(block.target_rate));
        log::debug!("Updated block {} to rate {}", block.id, block.target_rate);
        self.blocks[index] = block;
        Ok(())
    }

    /// Changes only the rate of an existing block.
    pub fn set_block_rate(&mut self, id: &str, target_rate: u32) -> Result<()> {
        let mut block = self
            .block(id)
            .cloned()
            .ok_or_else(|| RateGridError::BlockNotFound(id.to_string()))?;
        block.target_rate = target_rate;
        self.update_block(block)
    }

    /// Removes a block and resets its cell.
    pub fn delete_block(&mut self, id: &str) -> Result<Block> {
        let index = self
            .blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| RateGridError::BlockNotFound(id.to_string()))?;
        let block = self.blocks.remove(index);
        if let Some(cell) = self.grid.as_mut().and_then(|g| g.cell_mut(id)) {
            cell.reset();
        }
        if self.selected_block.as_deref() == Some(id) {
            self.selected_block = None;
        }
        self.selected_cells.retain(|c| c != id);
        log::debug!("Deleted block {id}");
        Ok(block)
    }

    /// Removes every block and resets every cell.
    pub fn clear_all(&mut self) {
        self.blocks.clear();
        self.selected_block = None;
        self.selected_cells.clear();
        if let Some(grid) = self.grid.as_mut() {
            grid.cells_mut().for_each(Cell::reset);
        }
        log::debug!("Cleared all blocks");
    }

    /// Applies one status and rate to several cells at once.
    ///
    /// `unselected` removes the cells' blocks; `selected` and `applied`
    /// require a rate and create or replace a block per cell. Either every
    /// cell is updated or, on error, none is.
    pub fn batch_set_status(
        &mut self,
        cell_ids: &[String],
        status: CellStatus,
        target_rate: Option<u32>,
    ) -> Result<usize> {
        let rate = match (status, target_rate) {
            (CellStatus::Unselected, _) => None,
            (_, Some(rate)) => {
                check_rate(rate)?;
                Some(rate)
            }
            (_, None) => return Err(RateGridError::MissingTargetRate(status.to_string())),
        };
        let grid = self.grid.as_mut().ok_or(RateGridError::GridNotReady)?;
        if let Some(missing) = cell_ids.iter().find(|id| grid.cell(id).is_none()) {
            return Err(RateGridError::UnknownCell(missing.clone()));
        }

        let ids: HashSet<&str> = cell_ids.iter().map(String::as_str).collect();
        self.blocks.retain(|b| !ids.contains(b.id.as_str()));
        let mut seen = HashSet::new();
        for id in cell_ids {
            if !seen.insert(id.as_str()) {
                continue;
            }
            let Some(cell) = grid.cell_mut(id) else {
                continue;
            };
            mark_cell(cell, status, rate);
            if let Some(rate) = rate {
                self.blocks.push(Block::for_cell(cell, rate));
            }
        }
        if rate.is_none()
            && self
                .selected_block
                .as_deref()
                .is_some_and(|id| ids.contains(id))
        {
            self.selected_block = None;
        }
        log::debug!("Set {} cell(s) to {status}", seen.len());
        Ok(seen.len())
    }

    /// Snaps a click to its cell, making that cell current and selecting
    /// the block on it, if any.
    pub fn select_cell(&mut self, lat: f64, lng: f64) -> Result<&Cell> {
        let grid = self.grid.as_ref().ok_or(RateGridError::GridNotReady)?;
        let cell = grid.locate_checked(lat, lng)?;
        self.current_cell = Some(cell.id.clone());
        self.selected_block = self
            .blocks
            .iter()
            .any(|b| b.id == cell.id)
            .then(|| cell.id.clone());
        Ok(cell)
    }

    /// Moves the current cell one step, clamped at the grid edge.
    pub fn step_selection(&mut self, direction: Direction) -> Option<&Cell> {
        let grid = self.grid.as_ref()?;
        let current = self.current_cell.as_deref()?;
        let cell = grid.neighbor(current, direction)?;
        self.current_cell = Some(cell.id.clone());
        self.selected_block = self
            .blocks
            .iter()
            .any(|b| b.id == cell.id)
            .then(|| cell.id.clone());
        Some(cell)
    }

    pub fn current_cell(&self) -> Option<&Cell> {
        let id = self.current_cell.as_deref()?;
        self.grid.as_ref()?.cell(id)
    }

    pub fn selected_block(&self) -> Option<&Block> {
        self.selected_block.as_deref().and_then(|id| self.block(id))
    }

    pub fn deselect_block(&mut self) {
        self.selected_block = None;
    }

    /// Adds the cell to the multi-selection, or removes it if present.
    /// Returns whether the cell is selected afterwards.
    pub fn toggle_cell_selection(&mut self, cell_id: &str) -> Result<bool> {
        let grid = self.grid.as_ref().ok_or(RateGridError::GridNotReady)?;
        if grid.cell(cell_id).is_none() {
            return Err(RateGridError::UnknownCell(cell_id.to_string()));
        }
        if let Some(pos) = self.selected_cells.iter().position(|c| c == cell_id) {
            self.selected_cells.remove(pos);
            Ok(false)
        } else {
            self.selected_cells.push(cell_id.to_string());
            Ok(true)
        }
    }

    pub fn selected_cells(&self) -> &[String] {
        &self.selected_cells
    }

    pub fn clear_cell_selection(&mut self) {
        self.selected_cells.clear();
    }

    /// Runs [`EditorState::batch_set_status`] on the multi-selection and
    /// clears it on success.
    pub fn apply_to_selection(&mut self, status: CellStatus, target_rate: Option<u32>) -> Result<usize> {
        let ids = self.selected_cells.clone();
        let count = self.batch_set_status(&ids, status, target_rate)?;
        self.selected_cells.clear();
        Ok(count)
    }

    /// Computes the grid `settings` would produce and what committing it
    /// would discard, without changing anything.
    pub fn propose_grid_change(&self, settings: GridSettings) -> Result<GridChangeProposal> {
        let grid = settings.generate()?;
        Ok(GridChangeProposal {
            settings,
            grid,
            discarded_blocks: self.blocks.len(),
        })
    }

    /// Applies a proposed grid. Existing blocks are discarded, which needs
    /// `confirmed` whenever there are any.
    pub fn commit_grid_change(&mut self, proposal: GridChangeProposal, confirmed: bool) -> Result<usize> {
        let discarded = self.blocks.len();
        if discarded > 0 && !confirmed {
            return Err(RateGridError::ConfirmationRequired(discarded));
        }
        self.settings = proposal.settings;
        self.grid = Some(proposal.grid);
        self.blocks.clear();
        self.current_cell = None;
        self.selected_block = None;
        self.selected_cells.clear();
        log::info!("Grid regenerated, {discarded} block(s) discarded");
        Ok(discarded)
    }

    /// Replaces all blocks, re-snapping each into the live grid.
    ///
    /// Blocks are placed by the centre of their stored diagonal, or by id
    /// when they carry no geometry. Blocks that land outside the grid, on a
    /// cell already taken, or with a zero rate are skipped.
    pub fn import_blocks(&mut self, blocks: Vec<Block>) -> Result<ImportReport> {
        if self.grid.is_none() {
            return Err(RateGridError::GridNotReady);
        }
        self.clear_all();
        let grid = self.grid.as_mut().ok_or(RateGridError::GridNotReady)?;

        let mut report = ImportReport::default();
        for incoming in blocks {
            let target = match incoming.anchor() {
                Some(anchor) => grid.locate(anchor.latitude, anchor.longitude),
                None => grid.cell(&incoming.id),
            };
            let placed = target
                .filter(|_| incoming.target_rate > 0)
                .filter(|cell| !self.blocks.iter().any(|b| b.id == cell.id))
                .map(|cell| Block::for_cell(cell, incoming.target_rate));
            match placed {
                Some(block) => {
                    if let Some(cell) = grid.cell_mut(&block.id) {
                        mark_cell(cell, CellStatus::Selected, Some(block.target_rate));
                    }
                    self.blocks.push(block);
                    report.imported += 1;
                }
                None => {
                    log::warn!("Skipping imported block '{}'", incoming.id);
                    report.skipped += 1;
                }
            }
        }
        log::info!(
            "Imported {} block(s), skipped {}",
            report.imported,
            report.skipped
        );
        Ok(report)
    }

    /// Replaces all blocks with decoded part-file records.
    pub fn import_part_records(&mut self, records: Vec<PartRecord>) -> Result<ImportReport> {
        self.import_blocks(records.into_iter().map(PartRecord::into_block).collect())
    }

    /// Verifies the cell/block consistency rules.
    pub fn check_invariants(&self) -> Result<()> {
        let violation = |msg: String| Err(RateGridError::InvariantViolation(msg));
        let Some(grid) = &self.grid else {
            if self.blocks.is_empty() {
                return Ok(());
            }
            return violation("blocks exist without a grid".to_string());
        };
        for cell in grid.cells() {
            let treated = cell.status != CellStatus::Unselected;
            if treated != cell.target_rate.is_some() {
                return violation(format!(
                    "cell {} is {} with rate {:?}",
                    cell.id, cell.status, cell.target_rate
                ));
            }
        }
        let mut ids = HashSet::new();
        for block in &self.blocks {
            if !ids.insert(block.id.as_str()) {
                return violation(format!("duplicate block {}", block.id));
            }
            let Some(cell) = grid.cell(&block.id) else {
                return violation(format!("block {} has no cell", block.id));
            };
            if cell.target_rate != Some(block.target_rate) {
                return violation(format!(
                    "block {} rate {} differs from cell rate {:?}",
                    block.id, block.target_rate, cell.target_rate
                ));
            }
        }
        Ok(())
    }

    fn restore_statuses(&mut self, statuses: &BTreeMap<String, CellStatus>) {
        let Some(grid) = self.grid.as_mut() else {
            return;
        };
        for block in &self.blocks {
            let Some(&status) = statuses.get(&block.id) else {
                continue;
            };
            if status == CellStatus::Unselected {
                continue;
            }
            if let Some(cell) = grid.cell_mut(&block.id) {
                mark_cell(cell, status, Some(block.target_rate));
            }
        }
    }

    /// Writes settings, blocks and cell statuses to `store`.
    pub fn persist(&self, store: &mut dyn KeyValueStore) -> Result<()> {
        store.set(SETTINGS_KEY, &serde_json::to_vec(&self.settings)?)?;
        if self.blocks.is_empty() {
            store.remove(BLOCKS_KEY)?;
            store.remove(CELL_STATUS_KEY)?;
        } else {
            store.set(BLOCKS_KEY, &serde_json::to_vec(&self.blocks)?)?;
            let statuses: BTreeMap<&str, CellStatus> = self
                .blocks
                .iter()
                .filter_map(|b| {
                    let cell = self.grid.as_ref()?.cell(&b.id)?;
                    Some((b.id.as_str(), cell.status))
                })
                .collect();
            store.set(CELL_STATUS_KEY, &serde_json::to_vec(&statuses)?)?;
        }
        log::info!("Persisted settings and {} block(s)", self.blocks.len());
        Ok(())
    }

    /// Rebuilds a session from `store`, falling back to default settings.
    ///
    /// The grid is regenerated from the saved settings and saved blocks are
    /// re-snapped into it; nothing is discarded. Saved cell statuses are
    /// reapplied to the cells that still own a block.
    pub fn restore(store: &dyn KeyValueStore) -> Result<Self> {
        let settings = match store.get(SETTINGS_KEY)? {
            Some(bytes) => {
                log::info!("Grid settings restored from previous session");
                serde_json::from_slice(&bytes)?
            }
            None => GridSettings::default(),
        };
        let mut state = Self::with_settings(settings)?;
        if let Some(bytes) = store.get(BLOCKS_KEY)? {
            let data = String::from_utf8_lossy(&bytes);
            let blocks = crate::io::json::blocks_from_json(&data)?;
            state.import_blocks(blocks)?;
        }
        if let Some(bytes) = store.get(CELL_STATUS_KEY)? {
            let statuses: BTreeMap<String, CellStatus> = serde_json::from_slice(&bytes)?;
            state.restore_statuses(&statuses);
        }
        state.check_invariants()?;
        Ok(state)
    }
}
