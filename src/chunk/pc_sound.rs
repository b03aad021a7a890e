//! PC Speaker Sound Chunks
//!
//! Format (little-endian):
//! - u32 tone length (number of payload bytes)
//! - u16 priority
//! - payload: one timer-period byte per 140 Hz tick

use std::io::{Read, Seek};

use nom::number::complete::{le_u16, le_u32};
use nom::sequence::tuple;

use super::read_chunk;
use crate::container::{IndexEntry, ParseResult};
use crate::{Result, WolfSoundsError};

/// Size of the length + priority header
pub const PC_SOUND_HEADER_SIZE: usize = 6;

/// Decoded PC speaker sound
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcSoundChunk {
    /// Declared payload length
    pub tone_length: u32,
    /// Playback priority used by the game's sound manager
    pub priority: u16,
    /// Tone period bytes, one per tick (0 = silence)
    pub payload: Vec<u8>,
}

fn header(input: &[u8]) -> ParseResult<'_, (u32, u16)> {
    tuple((le_u32, le_u16))(input)
}

impl PcSoundChunk {
    /// Decode a PC sound from its chunk bytes
    ///
    /// `index` is only used to label errors.
    pub fn parse(index: usize, bytes: &[u8]) -> Result<Self> {
        let (rest, (tone_length, priority)) = header(bytes).map_err(|_| {
            WolfSoundsError::invalid_length(
                index,
                format!(
                    "PC sound header needs {} bytes, chunk holds {}",
                    PC_SOUND_HEADER_SIZE,
                    bytes.len()
                ),
            )
        })?;

        if tone_length as usize > rest.len() {
            return Err(WolfSoundsError::invalid_length(
                index,
                format!(
                    "PC sound declares {} tone bytes but only {} remain in the chunk",
                    tone_length,
                    rest.len()
                ),
            ));
        }

        Ok(PcSoundChunk {
            tone_length,
            priority,
            payload: rest[..tone_length as usize].to_vec(),
        })
    }
}

/// Seek to a chunk and decode it as a PC sound
pub fn parse_pc_sound<R: Read + Seek>(
    reader: &mut R,
    index: usize,
    entry: &IndexEntry,
) -> Result<PcSoundChunk> {
    let bytes = read_chunk(reader, index, entry)?;
    PcSoundChunk::parse(index, &bytes)
}
