//! Raw Digitized Chunks
//!
//! VSWAP sound pages are stored as plain unsigned 8-bit PCM with no header.

use std::io::{Read, Seek};

use super::read_chunk;
use crate::container::IndexEntry;
use crate::Result;

/// Extract a chunk verbatim as unsigned 8-bit PCM
pub fn extract_raw_chunk<R: Read + Seek>(
    reader: &mut R,
    index: usize,
    entry: &IndexEntry,
) -> Result<Vec<u8>> {
    read_chunk(reader, index, entry)
}
