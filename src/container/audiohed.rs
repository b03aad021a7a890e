//! AUDIOHED Offset Table Parser
//!
//! AUDIOHED is a flat array of N+1 little-endian u32 offsets into AUDIOT.
//! Chunk `i` spans `offset[i]..offset[i + 1]`, so the last offset is the
//! total length of the data file.

use std::fs;
use std::path::Path;

use log::debug;
use nom::multi::count;
use nom::number::complete::le_u32;

use super::{IndexEntry, ParseResult};
use crate::{Result, WolfSoundsError};

/// Size of one stored offset
const OFFSET_SIZE: usize = 4;

fn offsets(input: &[u8], n: usize) -> ParseResult<'_, Vec<u32>> {
    count(le_u32, n)(input)
}

/// Parse an AUDIOHED offset table into chunk descriptors
///
/// The input must be a whole number of u32 offsets and hold at least two of
/// them. Offsets must never decrease: a chunk with a negative size is reported
/// as [`WolfSoundsError::InvalidLength`] for that chunk.
pub fn parse_offset_table(bytes: &[u8]) -> Result<Vec<IndexEntry>> {
    if !bytes.len().is_multiple_of(OFFSET_SIZE) {
        return Err(WolfSoundsError::truncated(format!(
            "offset table length {} is not a multiple of {}",
            bytes.len(),
            OFFSET_SIZE
        )));
    }

    let n = bytes.len() / OFFSET_SIZE;
    if n < 2 {
        return Err(WolfSoundsError::truncated(format!(
            "offset table holds {} offsets, at least 2 are required",
            n
        )));
    }

    let (_, table) = offsets(bytes, n)
        .map_err(|e| WolfSoundsError::truncated(format!("offset table: {}", e)))?;

    let entries = table
        .windows(2)
        .enumerate()
        .map(|(i, pair)| {
            let size = pair[1].checked_sub(pair[0]).ok_or_else(|| {
                WolfSoundsError::invalid_length(
                    i,
                    format!("offset {} is followed by smaller offset {}", pair[0], pair[1]),
                )
            })?;
            Ok(IndexEntry::new(pair[0], size))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!("offset table: {} chunks", entries.len());
    Ok(entries)
}

/// Load and parse an AUDIOHED file from disk
pub fn load_audiohed<P: AsRef<Path>>(path: P) -> Result<Vec<IndexEntry>> {
    let bytes = fs::read(path.as_ref())?;
    parse_offset_table(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(offsets: &[u32]) -> Vec<u8> {
        offsets.iter().flat_map(|o| o.to_le_bytes()).collect()
    }

    #[test]
    fn test_consecutive_differences() {
        let entries = parse_offset_table(&table(&[0, 10, 10, 20])).unwrap();
        assert_eq!(
            entries,
            vec![
                IndexEntry::new(0, 10),
                IndexEntry::new(10, 0),
                IndexEntry::new(10, 10),
            ]
        );
    }

    #[test]
    fn test_n_plus_one_offsets_give_n_entries() {
        let offsets: Vec<u32> = (0..50).map(|i| i * i).collect();
        let entries = parse_offset_table(&table(&offsets)).unwrap();
        assert_eq!(entries.len(), offsets.len() - 1);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.offset, offsets[i]);
            assert_eq!(entry.size, offsets[i + 1] - offsets[i]);
        }
    }

    #[test]
    fn test_minimum_table() {
        let entries = parse_offset_table(&table(&[4, 9])).unwrap();
        assert_eq!(entries, vec![IndexEntry::new(4, 5)]);
    }

    #[test]
    fn test_rejects_partial_offset() {
        let mut bytes = table(&[0, 10]);
        bytes.push(0);
        assert!(matches!(
            parse_offset_table(&bytes),
            Err(WolfSoundsError::TruncatedIndex { .. })
        ));
    }

    #[test]
    fn test_rejects_single_offset() {
        assert!(matches!(
            parse_offset_table(&table(&[0])),
            Err(WolfSoundsError::TruncatedIndex { .. })
        ));
        assert!(matches!(
            parse_offset_table(&[]),
            Err(WolfSoundsError::TruncatedIndex { .. })
        ));
    }

    #[test]
    fn test_rejects_decreasing_offsets() {
        let err = parse_offset_table(&table(&[0, 10, 5, 20])).unwrap_err();
        assert_eq!(err.chunk(), Some(1));
    }
}
