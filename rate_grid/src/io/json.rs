//! JSON backup format for block lists.

use serde_json::Value;

use crate::block::Block;
use crate::error::{RateGridError, Result};

/// Serializes blocks as a pretty-printed JSON array.
pub fn blocks_to_json(blocks: &[Block]) -> Result<String> {
    Ok(serde_json::to_string_pretty(blocks)?)
}

/// Parses a JSON array of block records.
///
/// Anything other than an array, or an element missing one of the block
/// fields, is rejected with [`RateGridError::InvalidFileStructure`].
pub fn blocks_from_json(data: &str) -> Result<Vec<Block>> {
    let value: Value = serde_json::from_str(data)
        .map_err(|e| RateGridError::InvalidFileStructure(e.to_string()))?;
    let Value::Array(items) = value else {
        return Err(RateGridError::InvalidFileStructure(
            "expected an array of blocks".to_string(),
        ));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(idx, item)| {
            serde_json::from_value::<Block>(item)
                .map_err(|e| RateGridError::InvalidFileStructure(format!("block {idx}: {e}")))
        })
        .collect()
}

/// Writes blocks to a JSON backup file.
pub fn write_blocks_json(path: &str, blocks: &[Block]) -> Result<()> {
    if blocks.is_empty() {
        return Err(RateGridError::NoValidBlocks);
    }
    super::write_string(path, &blocks_to_json(blocks)?)?;
    log::info!("Wrote {} block(s) to {path}", blocks.len());
    Ok(())
}

/// Reads blocks from a JSON backup file.
pub fn read_blocks_json(path: &str) -> Result<Vec<Block>> {
    let data = super::read_to_string(path)?;
    let blocks = blocks_from_json(&data)?;
    log::info!("Read {} block(s) from {path}", blocks.len());
    Ok(blocks)
}
