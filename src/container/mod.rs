//! Container Index Domain
//!
//! Index layouts that locate chunks inside the game's data files:
//! - `audiohed` - flat offset table describing the AUDIOT data file
//! - `vswap` - self-contained VSWAP header with offset and size tables

pub mod audiohed;
pub mod vswap;

pub use audiohed::{load_audiohed, parse_offset_table};
pub use vswap::{parse_vswap_header, DigitizedSound, VSwapContainer, VSwapEntry, VSwapHeader};

/// nom result over raw little-endian container bytes
pub(crate) type ParseResult<'a, T> = nom::IResult<&'a [u8], T, nom::error::Error<&'a [u8]>>;

/// Location of one chunk inside a companion data file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IndexEntry {
    /// Byte offset of the chunk
    pub offset: u32,
    /// Chunk length in bytes
    pub size: u32,
}

impl IndexEntry {
    /// Create an entry from an offset and a size
    pub fn new(offset: u32, size: u32) -> Self {
        IndexEntry { offset, size }
    }

    /// Offset one past the last byte of the chunk
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }

    /// True when the chunk holds no bytes
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }
}
