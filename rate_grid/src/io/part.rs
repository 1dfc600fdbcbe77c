//! Binary part-file codec consumed by field equipment.
//!
//! A part file is a plain concatenation of fixed 20-byte big-endian
//! records, one per block, with no header or footer:
//!
//! | offset | size | field                                   |
//! |--------|------|-----------------------------------------|
//! | 0      | 1    | format version (`1`)                    |
//! | 1      | 2    | target rate, `u16`                      |
//! | 3      | 4    | top-left latitude, `i32` degrees × 1e7  |
//! | 7      | 4    | top-left longitude                      |
//! | 11     | 4    | bottom-right latitude                   |
//! | 15     | 4    | bottom-right longitude                  |
//! | 19     | 1    | reserved, zero                          |
//!
//! Records are written in reading order: descending top latitude, then
//! ascending left longitude.

use std::cmp::Ordering;
use std::io::Cursor;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::block::Block;
use crate::error::{RateGridError, Result};
use crate::geometry::Point;

/// Size of one record in bytes.
pub const RECORD_SIZE: usize = 20;
/// The only record version this codec reads and writes.
pub const PART_FILE_VERSION: u8 = 1;
const COORDINATE_SCALE: f64 = 1e7;

/// Converts decimal degrees to the fixed-point wire value.
///
/// Halfway values round towards positive infinity, as the field devices
/// expect, so `-0.5` units encodes to `0` rather than `-1`.
pub fn encode_coordinate(degrees: f64) -> i32 {
    (degrees * COORDINATE_SCALE + 0.5).floor() as i32
}

/// Converts a fixed-point wire value back to decimal degrees.
pub fn decode_coordinate(value: i32) -> f64 {
    f64::from(value) / COORDINATE_SCALE
}

/// Checks that a rate fits the 16-bit rate field.
pub fn encode_target_rate(rate: u32) -> Result<u16> {
    u16::try_from(rate).map_err(|_| RateGridError::TargetRateOutOfRange(rate))
}

/// One decoded record: a rate and the cell diagonal it applies to.
///
/// Cell ids, full corner lists and statuses are not stored in the file;
/// they are recovered by snapping the diagonal into a live grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartRecord {
    pub target_rate: u16,
    /// Top-left and bottom-right corners.
    pub original_coordinates: [Point; 2],
}

impl PartRecord {
    /// Builds a record from a block, or `None` if the block lacks geometry.
    pub fn from_block(block: &Block) -> Option<Result<Self>> {
        if !block.has_complete_geometry() {
            return None;
        }
        let rate = match encode_target_rate(block.target_rate) {
            Ok(rate) => rate,
            Err(e) => return Some(Err(e)),
        };
        Some(Ok(Self {
            target_rate: rate,
            original_coordinates: [block.original_coordinates[0], block.original_coordinates[1]],
        }))
    }

    /// Converts the record into an unplaced block carrying only its diagonal.
    pub fn into_block(self) -> Block {
        Block {
            id: String::new(),
            target_rate: u32::from(self.target_rate),
            coordinates: Vec::new(),
            original_coordinates: self.original_coordinates.to_vec(),
        }
    }

    fn top(&self) -> f64 {
        let [a, b] = self.original_coordinates;
        a.latitude.max(b.latitude)
    }

    fn left(&self) -> f64 {
        let [a, b] = self.original_coordinates;
        a.longitude.min(b.longitude)
    }

    fn write_to(&self, out: &mut Vec<u8>) -> std::io::Result<()> {
        let [c1, c2] = self.original_coordinates;
        out.write_u8(PART_FILE_VERSION)?;
        out.write_u16::<BigEndian>(self.target_rate)?;
        out.write_i32::<BigEndian>(encode_coordinate(c1.latitude))?;
        out.write_i32::<BigEndian>(encode_coordinate(c1.longitude))?;
        out.write_i32::<BigEndian>(encode_coordinate(c2.latitude))?;
        out.write_i32::<BigEndian>(encode_coordinate(c2.longitude))?;
        out.write_u8(0)
    }
}

/// Reading order: top to bottom, then left to right.
fn reading_order(a: &PartRecord, b: &PartRecord) -> Ordering {
    b.top()
        .total_cmp(&a.top())
        .then_with(|| a.left().total_cmp(&b.left()))
}

/// Encodes records in reading order.
pub fn encode_records(records: &[PartRecord]) -> Result<Vec<u8>> {
    if records.is_empty() {
        return Err(RateGridError::NoValidBlocks);
    }
    let mut sorted = records.to_vec();
    sorted.sort_by(reading_order);

    let mut out = Vec::with_capacity(sorted.len() * RECORD_SIZE);
    for record in &sorted {
        record.write_to(&mut out)?;
    }
    Ok(out)
}

/// Encodes every block with complete geometry into part-file bytes.
///
/// Blocks without four corners or without a two-point diagonal are skipped;
/// if nothing remains the result is [`RateGridError::NoValidBlocks`].
pub fn encode_part_file(blocks: &[Block]) -> Result<Vec<u8>> {
    let records = blocks
        .iter()
        .filter_map(PartRecord::from_block)
        .collect::<Result<Vec<_>>>()?;
    let skipped = blocks.len() - records.len();
    if skipped > 0 {
        log::warn!("Skipping {skipped} block(s) with incomplete geometry");
    }
    encode_records(&records)
}

/// Decodes part-file bytes into records.
pub fn decode_part_file(bytes: &[u8]) -> Result<Vec<PartRecord>> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(RateGridError::MalformedFile {
            len: bytes.len(),
            record: RECORD_SIZE,
        });
    }

    let mut records = Vec::with_capacity(bytes.len() / RECORD_SIZE);
    for (index, chunk) in bytes.chunks_exact(RECORD_SIZE).enumerate() {
        let mut cursor = Cursor::new(chunk);
        let version = cursor.read_u8()?;
        if version != PART_FILE_VERSION {
            return Err(RateGridError::UnsupportedVersion {
                index,
                found: version,
            });
        }
        let target_rate = cursor.read_u16::<BigEndian>()?;
        let lat1 = decode_coordinate(cursor.read_i32::<BigEndian>()?);
        let lng1 = decode_coordinate(cursor.read_i32::<BigEndian>()?);
        let lat2 = decode_coordinate(cursor.read_i32::<BigEndian>()?);
        let lng2 = decode_coordinate(cursor.read_i32::<BigEndian>()?);
        records.push(PartRecord {
            target_rate,
            original_coordinates: [Point::new(lat1, lng1), Point::new(lat2, lng2)],
        });
    }
    Ok(records)
}

/// Writes blocks to a `.prt` file and returns the number of records.
pub fn write_part_file(path: &str, blocks: &[Block]) -> Result<usize> {
    let bytes = encode_part_file(blocks)?;
    super::write_bytes(path, &bytes)?;
    let count = bytes.len() / RECORD_SIZE;
    log::info!("Wrote {count} part-file record(s) to {path}");
    Ok(count)
}

/// Reads and decodes a `.prt` file.
pub fn read_part_file(path: &str) -> Result<Vec<PartRecord>> {
    let bytes = super::read_bytes(path)?;
    let records = decode_part_file(&bytes)?;
    log::info!("Read {} part-file record(s) from {path}", records.len());
    Ok(records)
}
