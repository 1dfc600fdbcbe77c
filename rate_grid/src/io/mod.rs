//! File input and output for grid and block data.

pub mod geojson;
pub mod json;
pub mod part;

use std::fs::File;
use std::io::{self, Read, Write};

/// Reads a file to string.
pub fn read_to_string(path: &str) -> io::Result<String> {
    let mut buffer = String::new();
    File::open(path)?.read_to_string(&mut buffer)?;
    Ok(buffer)
}

/// Writes a string to a file, replacing any existing contents.
pub fn write_string(path: &str, contents: &str) -> io::Result<()> {
    write_bytes(path, contents.as_bytes())
}

/// Reads a whole file into memory.
pub fn read_bytes(path: &str) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    File::open(path)?.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Writes raw bytes to a file, replacing any existing contents.
pub fn write_bytes(path: &str, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.flush()
}
