use thiserror::Error;

/// Errors produced by grid, state and interchange operations.
///
/// Every variant is recoverable; callers surface them as non-blocking
/// notifications and keep running.
#[derive(Debug, Error)]
pub enum RateGridError {
    /// Rows, columns or a cell dimension was zero or negative.
    #[error("Invalid grid parameters: rows, columns and cell size must be positive")]
    InvalidGridParameters,

    /// An operation needed a grid before one was generated.
    #[error("Grid is not available. Generate the grid first")]
    GridNotReady,

    /// The point does not fall inside any cell of the current grid.
    #[error("No grid cell found at ({lat}, {lng})")]
    NoCellAtLocation { lat: f64, lng: f64 },

    /// A block already owns the cell.
    #[error("Block already exists for cell {0}")]
    DuplicateBlock(String),

    /// No block with this id exists.
    #[error("Block {0} not found")]
    BlockNotFound(String),

    /// A cell id does not exist in the current grid.
    #[error("Cell {0} is not part of the current grid")]
    UnknownCell(String),

    /// Nothing to export after filtering incomplete blocks.
    #[error("No valid blocks with complete data")]
    NoValidBlocks,

    /// A part file whose length is not a whole number of records.
    #[error("Malformed part file: {len} bytes is not a multiple of {record} bytes")]
    MalformedFile { len: usize, record: usize },

    /// A part-file record carries a version byte this build cannot read.
    #[error("Unsupported part file version {found} in record {index}")]
    UnsupportedVersion { index: usize, found: u8 },

    /// A JSON payload that is not an array of block records.
    #[error("Invalid file structure: {0}")]
    InvalidFileStructure(String),

    /// A target rate that is zero or does not fit the part-file field.
    #[error("Target rate {0} is out of range")]
    TargetRateOutOfRange(u32),

    /// A selected or applied status was requested without a rate.
    #[error("A target rate is required for status {0}")]
    MissingTargetRate(String),

    /// Cells and blocks disagree about treatment state.
    #[error("Inconsistent cell/block state: {0}")]
    InvariantViolation(String),

    /// A destructive grid change was committed without confirmation.
    #[error("Changing the grid will clear {0} existing block(s); confirmation required")]
    ConfirmationRequired(usize),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, RateGridError>;
