//! VSWAP Container Parser
//!
//! VSWAP is a self-contained page file mixing wall, sprite and digitized sound
//! chunks. Layout (little-endian):
//! - Header: chunk count, first sprite chunk, first sound chunk (u16 each)
//! - Offset table: `chunk_count` x u32
//! - Size table: `chunk_count` x u16
//! - Chunk payloads at their offsets
//!
//! The final chunk is the sound-info table: (u16 start page, u16 byte length)
//! pairs locating each digitized sound across consecutive sound pages.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, info};
use nom::multi::count;
use nom::number::complete::{le_u16, le_u32};
use nom::sequence::tuple;

use super::{IndexEntry, ParseResult};
use crate::chunk::raw::extract_raw_chunk;
use crate::{Result, WolfSoundsError};

/// Fixed header size (three u16 fields)
pub const VSWAP_HEADER_SIZE: usize = 6;
/// Bytes of index data per chunk (u32 offset + u16 size)
const INDEX_BYTES_PER_CHUNK: usize = 6;

/// VSWAP header fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VSwapHeader {
    /// Number of chunks in the file
    pub chunk_count: u16,
    /// Index of the first sprite chunk
    pub sprite_start: u16,
    /// Index of the first digitized sound chunk
    pub sound_start: u16,
}

impl VSwapHeader {
    /// Total size of header plus both index tables
    pub fn index_size(&self) -> usize {
        VSWAP_HEADER_SIZE + self.chunk_count as usize * INDEX_BYTES_PER_CHUNK
    }
}

/// One VSWAP chunk with its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VSwapEntry {
    /// Byte offset of the chunk in the file
    pub offset: u32,
    /// Chunk length in bytes
    pub size: u16,
    /// Chunk payload
    pub data: Vec<u8>,
}

/// A digitized sound reassembled from consecutive sound pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitizedSound {
    /// Position in the sound-info table
    pub index: usize,
    /// Unsigned 8-bit PCM
    pub data: Vec<u8>,
}

fn header(input: &[u8]) -> ParseResult<'_, VSwapHeader> {
    let (rest, (chunk_count, sprite_start, sound_start)) =
        tuple((le_u16, le_u16, le_u16))(input)?;
    Ok((
        rest,
        VSwapHeader {
            chunk_count,
            sprite_start,
            sound_start,
        },
    ))
}

fn tables(input: &[u8], n: usize) -> ParseResult<'_, (Vec<u32>, Vec<u16>)> {
    tuple((count(le_u32, n), count(le_u16, n)))(input)
}

fn sound_info(input: &[u8]) -> ParseResult<'_, Vec<(u16, u16)>> {
    count(tuple((le_u16, le_u16)), input.len() / 4)(input)
}

/// Parse the VSWAP header and both index tables
///
/// Returns the header fields and one [`IndexEntry`] per chunk, built from the
/// offset table and the (widened) size table.
pub fn parse_vswap_header(bytes: &[u8]) -> Result<(VSwapHeader, Vec<IndexEntry>)> {
    let (rest, header) = header(bytes).map_err(|_| {
        WolfSoundsError::truncated(format!(
            "VSWAP header needs {} bytes, got {}",
            VSWAP_HEADER_SIZE,
            bytes.len()
        ))
    })?;

    if bytes.len() < header.index_size() {
        return Err(WolfSoundsError::truncated(format!(
            "VSWAP index for {} chunks needs {} bytes, got {}",
            header.chunk_count,
            header.index_size(),
            bytes.len()
        )));
    }

    if header.sprite_start > header.sound_start || header.sound_start > header.chunk_count {
        return Err(WolfSoundsError::truncated(format!(
            "VSWAP sections out of range: sprites at {}, sounds at {}, {} chunks",
            header.sprite_start, header.sound_start, header.chunk_count
        )));
    }

    let n = header.chunk_count as usize;
    let (_, (offsets, sizes)) = tables(rest, n)
        .map_err(|e| WolfSoundsError::truncated(format!("VSWAP index tables: {}", e)))?;

    let entries = offsets
        .into_iter()
        .zip(sizes)
        .map(|(offset, size)| IndexEntry::new(offset, size as u32))
        .collect();

    Ok((header, entries))
}

/// Parsed VSWAP file: header plus every chunk payload
#[derive(Debug, Clone)]
pub struct VSwapContainer {
    /// Header fields
    pub header: VSwapHeader,
    /// All chunks in file order
    pub entries: Vec<VSwapEntry>,
}

impl VSwapContainer {
    /// Open a VSWAP file and read every chunk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        let container = Self::from_reader(&mut reader)?;
        info!(
            "{}: {} chunks, sounds from {}",
            path.as_ref().display(),
            container.header.chunk_count,
            container.header.sound_start
        );
        Ok(container)
    }

    /// Read header, index tables and chunk payloads from a seekable reader
    pub fn from_reader<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let mut fixed = [0u8; VSWAP_HEADER_SIZE];
        reader.read_exact(&mut fixed).map_err(|_| {
            WolfSoundsError::truncated(format!(
                "VSWAP header needs {} bytes",
                VSWAP_HEADER_SIZE
            ))
        })?;

        let chunk_count = u16::from_le_bytes([fixed[0], fixed[1]]) as usize;
        let mut index = vec![0u8; VSWAP_HEADER_SIZE + chunk_count * INDEX_BYTES_PER_CHUNK];
        index[..VSWAP_HEADER_SIZE].copy_from_slice(&fixed);
        reader
            .read_exact(&mut index[VSWAP_HEADER_SIZE..])
            .map_err(|_| {
                WolfSoundsError::truncated(format!(
                    "VSWAP index for {} chunks is incomplete",
                    chunk_count
                ))
            })?;

        let (header, table) = parse_vswap_header(&index)?;

        let entries = table
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let data = extract_raw_chunk(reader, i, entry)?;
                Ok(VSwapEntry {
                    offset: entry.offset,
                    size: entry.size as u16,
                    data,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VSwapContainer { header, entries })
    }

    /// Chunks from the first sound chunk to the end of the file
    ///
    /// This includes the trailing sound-info table chunk.
    pub fn sound_pages(&self) -> &[VSwapEntry] {
        &self.entries[self.header.sound_start as usize..]
    }

    /// Reassemble digitized sounds from the sound-info table
    ///
    /// Each table entry names a start page relative to the first sound chunk
    /// and the low 16 bits of its byte length. The high bits come from the
    /// pages the sound spans, up to the next entry's start page. Pages are
    /// then concatenated until the length is reached. Empty sounds are
    /// skipped.
    pub fn digitized_sounds(&self) -> Result<Vec<DigitizedSound>> {
        let sound_start = self.header.sound_start as usize;
        let Some(info_index) = self.entries.len().checked_sub(1) else {
            return Ok(Vec::new());
        };
        if info_index < sound_start {
            return Ok(Vec::new());
        }

        let info = &self.entries[info_index].data;
        if !info.len().is_multiple_of(4) {
            return Err(WolfSoundsError::invalid_length(
                info_index,
                format!("sound-info table length {} is not a multiple of 4", info.len()),
            ));
        }
        let (_, list) = sound_info(info).map_err(|e| {
            WolfSoundsError::invalid_length(info_index, format!("sound-info table: {}", e))
        })?;

        let mut sounds = Vec::with_capacity(list.len());
        for (index, &(start_page, low_length)) in list.iter().enumerate() {
            let first = sound_start + start_page as usize;
            let span_end = list
                .get(index + 1)
                .map(|&(next, _)| sound_start + next as usize)
                .filter(|&next| next > first && next < info_index)
                .unwrap_or(info_index);
            let span = self.span_size(first, span_end);
            let length = full_length(span, low_length);
            if length == 0 {
                debug!("digitized sound {}: empty, skipped", index);
                continue;
            }

            let mut data = Vec::with_capacity(length);
            let mut page = first;
            while data.len() < length {
                if page >= info_index {
                    return Err(WolfSoundsError::invalid_length(
                        page,
                        format!(
                            "digitized sound {} needs {} bytes but sound pages end after {}",
                            index,
                            length,
                            data.len()
                        ),
                    ));
                }
                data.extend_from_slice(&self.entries[page].data);
                page += 1;
            }
            data.truncate(length);
            sounds.push(DigitizedSound { index, data });
        }

        Ok(sounds)
    }

    /// Total bytes of the pages in `first..end`
    fn span_size(&self, first: usize, end: usize) -> usize {
        self.entries
            .get(first..end)
            .map_or(0, |pages| pages.iter().map(|p| p.data.len()).sum())
    }
}

/// Rebuild a sound length from its page span and the stored low 16 bits
///
/// Page sizes may include padding the stored length leaves out, so the low
/// bits always come from the table.
fn full_length(span: usize, low: u16) -> usize {
    let high = span & !0xFFFF;
    let length = high | low as usize;
    if length > span && high >= 0x1_0000 {
        length - 0x1_0000
    } else {
        length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Build a VSWAP image from chunk payloads
    fn build(sprite_start: u16, sound_start: u16, chunks: &[Vec<u8>]) -> Vec<u8> {
        let n = chunks.len();
        let mut out = Vec::new();
        out.extend_from_slice(&(n as u16).to_le_bytes());
        out.extend_from_slice(&sprite_start.to_le_bytes());
        out.extend_from_slice(&sound_start.to_le_bytes());

        let mut offset = (VSWAP_HEADER_SIZE + n * INDEX_BYTES_PER_CHUNK) as u32;
        for chunk in chunks {
            out.extend_from_slice(&offset.to_le_bytes());
            offset += chunk.len() as u32;
        }
        for chunk in chunks {
            out.extend_from_slice(&(chunk.len() as u16).to_le_bytes());
        }
        for chunk in chunks {
            out.extend_from_slice(chunk);
        }
        out
    }

    #[test]
    fn test_parse_header_fields_and_tables() {
        let image = build(1, 2, &[vec![1, 2], vec![3], vec![4, 5, 6]]);
        let (header, entries) = parse_vswap_header(&image).unwrap();

        assert_eq!(
            header,
            VSwapHeader {
                chunk_count: 3,
                sprite_start: 1,
                sound_start: 2
            }
        );
        assert_eq!(
            entries,
            vec![
                IndexEntry::new(24, 2),
                IndexEntry::new(26, 1),
                IndexEntry::new(27, 3),
            ]
        );
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(
            parse_vswap_header(&[3, 0, 0]),
            Err(WolfSoundsError::TruncatedIndex { .. })
        ));
    }

    #[test]
    fn test_index_tables_too_short() {
        let image = build(0, 0, &[vec![1], vec![2]]);
        assert!(matches!(
            parse_vswap_header(&image[..10]),
            Err(WolfSoundsError::TruncatedIndex { .. })
        ));
    }

    #[test]
    fn test_sections_out_of_range() {
        let image = build(0, 5, &[vec![1]]);
        assert!(matches!(
            parse_vswap_header(&image),
            Err(WolfSoundsError::TruncatedIndex { .. })
        ));
    }

    #[test]
    fn test_container_reads_payloads() {
        let image = build(0, 1, &[vec![9, 9], vec![0x80, 0x81, 0x82]]);
        let container = VSwapContainer::from_reader(&mut Cursor::new(image)).unwrap();

        assert_eq!(container.entries.len(), 2);
        assert_eq!(container.entries[1].data, vec![0x80, 0x81, 0x82]);
        assert_eq!(container.entries[1].size, 3);
        assert_eq!(container.sound_pages().len(), 1);
    }

    #[test]
    fn test_container_chunk_past_end_of_file() {
        let mut image = build(0, 0, &[vec![1, 2, 3, 4]]);
        image.truncate(image.len() - 2);
        let err = VSwapContainer::from_reader(&mut Cursor::new(image)).unwrap_err();
        assert_eq!(err.chunk(), Some(0));
    }

    #[test]
    fn test_digitized_sounds_join_pages() {
        // Sound pages: [1,2,3] [4,5,6] [7]; sound 0 spans pages 0-1, sound 1 is page 2
        let info: Vec<u8> = [(0u16, 5u16), (2, 1), (0, 0)]
            .iter()
            .flat_map(|(p, l)| {
                let mut v = p.to_le_bytes().to_vec();
                v.extend_from_slice(&l.to_le_bytes());
                v
            })
            .collect();
        let image = build(
            1,
            1,
            &[vec![0xEE], vec![1, 2, 3], vec![4, 5, 6], vec![7], info],
        );
        let container = VSwapContainer::from_reader(&mut Cursor::new(image)).unwrap();
        let sounds = container.digitized_sounds().unwrap();

        assert_eq!(sounds.len(), 2);
        assert_eq!(sounds[0].data, vec![1, 2, 3, 4, 5]);
        assert_eq!(sounds[1].index, 1);
        assert_eq!(sounds[1].data, vec![7]);
    }

    #[test]
    fn test_digitized_sound_past_last_page() {
        let info = [0u8, 0, 10, 0].to_vec();
        let image = build(0, 0, &[vec![1, 2, 3], info]);
        let container = VSwapContainer::from_reader(&mut Cursor::new(image)).unwrap();
        assert!(matches!(
            container.digitized_sounds(),
            Err(WolfSoundsError::InvalidLength { .. })
        ));
    }

    fn info_table(entries: &[(u16, u16)]) -> Vec<u8> {
        entries
            .iter()
            .flat_map(|(p, l)| [p.to_le_bytes(), l.to_le_bytes()].concat())
            .collect()
    }

    #[test]
    fn test_full_length_from_span() {
        assert_eq!(full_length(6, 5), 5);
        assert_eq!(full_length(70_000, (70_000 - 65_536) as u16), 70_000);
        // padded final page
        assert_eq!(full_length(70_001, (70_000 - 65_536) as u16), 70_000);
        // padding pushes the span across a 64K boundary
        assert_eq!(full_length(65_540, 0xFFFE), 65_534);
        assert_eq!(full_length(131_072, 0), 131_072);
    }

    #[test]
    fn test_digitized_sound_longer_than_64k() {
        let pages = vec![vec![0x80u8; 40_000], vec![0x81u8; 40_001]];
        let info = info_table(&[(0, (80_000 - 65_536) as u16)]);
        let image = build(0, 0, &[pages[0].clone(), pages[1].clone(), info]);
        let container = VSwapContainer::from_reader(&mut Cursor::new(image)).unwrap();
        let sounds = container.digitized_sounds().unwrap();

        assert_eq!(sounds.len(), 1);
        assert_eq!(sounds[0].data.len(), 80_000);
        assert_eq!(sounds[0].data[39_999], 0x80);
        assert_eq!(sounds[0].data[40_000], 0x81);
    }

    #[test]
    fn test_span_stops_at_next_sound() {
        // Sound 0 spans pages 0-1, sound 1 starts at page 2
        let info = info_table(&[(0, 4), (2, 2)]);
        let image = build(0, 0, &[vec![1, 2], vec![3, 4], vec![5, 6], info]);
        let container = VSwapContainer::from_reader(&mut Cursor::new(image)).unwrap();
        let sounds = container.digitized_sounds().unwrap();

        assert_eq!(sounds[0].data, vec![1, 2, 3, 4]);
        assert_eq!(sounds[1].data, vec![5, 6]);
    }
}
