//! Chunk Sub-Parsers
//!
//! Each AUDIOT/VSWAP chunk is located by an [`IndexEntry`] and decoded by one
//! of the parsers below:
//! - `pc_sound` - PC speaker tone periods
//! - `adlib_sound` - Adlib instrument plus note bytes (sound effects)
//! - `imf` - IMF register/value/delay event stream (music)
//! - `raw` - unsigned 8-bit digitized PCM

pub mod adlib_sound;
pub mod imf;
pub mod pc_sound;
pub mod raw;

pub use adlib_sound::{AdlibSoundChunk, Instrument};
pub use imf::{parse_adlib_events, AdlibEvent, AdlibEventStream};
pub use pc_sound::{parse_pc_sound, PcSoundChunk};
pub use raw::extract_raw_chunk;

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use crate::container::IndexEntry;
use crate::{Result, WolfSoundsError};

/// Read exactly the bytes an index entry describes
///
/// A chunk that runs past the end of the data file is reported as
/// [`WolfSoundsError::InvalidLength`] rather than returned short.
pub fn read_chunk<R: Read + Seek>(
    reader: &mut R,
    index: usize,
    entry: &IndexEntry,
) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(entry.offset as u64))?;

    let mut data = vec![0u8; entry.size as usize];
    reader.read_exact(&mut data).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => WolfSoundsError::invalid_length(
            index,
            format!(
                "{} bytes at offset {} run past the end of the data file",
                entry.size, entry.offset
            ),
        ),
        _ => WolfSoundsError::Io(e),
    })?;

    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_chunk_range() {
        let mut data = Cursor::new((0u8..16).collect::<Vec<_>>());
        let bytes = read_chunk(&mut data, 0, &IndexEntry::new(4, 3)).unwrap();
        assert_eq!(bytes, vec![4, 5, 6]);
    }

    #[test]
    fn test_read_chunk_short_read() {
        let mut data = Cursor::new(vec![0u8; 8]);
        let err = read_chunk(&mut data, 7, &IndexEntry::new(6, 4)).unwrap_err();
        assert_eq!(err.chunk(), Some(7));
    }

    #[test]
    fn test_read_empty_chunk() {
        let mut data = Cursor::new(vec![0u8; 8]);
        assert!(read_chunk(&mut data, 0, &IndexEntry::new(8, 0)).unwrap().is_empty());
    }
}
