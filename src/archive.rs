//! AUDIOHED/AUDIOT Archive
//!
//! Loads the index/data pair once, closes both files, and decodes chunks from
//! memory. Section readers fail fast on the first bad chunk; the per-chunk
//! accessors let a caller skip individual chunks instead.

use std::fs;
use std::io::Cursor;
use std::ops::Range;
use std::path::Path;

use log::{debug, info};

use crate::chunk::{self, AdlibEventStream, AdlibSoundChunk, PcSoundChunk};
use crate::container::{parse_offset_table, IndexEntry};
use crate::layout::SoundLayout;
use crate::{Result, WolfSoundsError};

/// Parsed AUDIOHED index plus the AUDIOT bytes it describes
#[derive(Debug, Clone)]
pub struct AudioArchive {
    entries: Vec<IndexEntry>,
    data: Vec<u8>,
}

impl AudioArchive {
    /// Read AUDIOHED and AUDIOT from disk
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(audiohed: P, audiot: Q) -> Result<Self> {
        let index = fs::read(audiohed.as_ref())?;
        let data = fs::read(audiot.as_ref())?;
        let archive = Self::from_bytes(&index, data)?;
        info!(
            "{}: {} chunks, {} bytes of data",
            audiot.as_ref().display(),
            archive.len(),
            archive.data.len()
        );
        Ok(archive)
    }

    /// Build an archive from an in-memory index and data file
    pub fn from_bytes(index: &[u8], data: Vec<u8>) -> Result<Self> {
        let entries = parse_offset_table(index)?;
        Ok(AudioArchive { entries, data })
    }

    /// Number of chunks in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the index describes no chunks
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All index entries
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    fn entry(&self, index: usize) -> Result<&IndexEntry> {
        self.entries.get(index).ok_or_else(|| {
            WolfSoundsError::truncated(format!(
                "chunk {} requested from an index of {} chunks",
                index,
                self.entries.len()
            ))
        })
    }

    /// Raw bytes of one chunk
    pub fn chunk(&self, index: usize) -> Result<Vec<u8>> {
        let entry = self.entry(index)?;
        chunk::read_chunk(&mut Cursor::new(&self.data), index, entry)
    }

    /// Decode one chunk as a PC speaker sound
    pub fn pc_sound(&self, index: usize) -> Result<PcSoundChunk> {
        let entry = self.entry(index)?;
        chunk::parse_pc_sound(&mut Cursor::new(&self.data), index, entry)
    }

    /// Decode one chunk as an Adlib sound effect
    pub fn adlib_sound(&self, index: usize) -> Result<AdlibSoundChunk> {
        AdlibSoundChunk::parse(index, &self.chunk(index)?)
    }

    /// Decode one chunk as an IMF music stream
    pub fn music(&self, index: usize) -> Result<AdlibEventStream> {
        let entry = self.entry(index)?;
        chunk::parse_adlib_events(&mut Cursor::new(&self.data), index, entry)
    }

    fn read_section<T>(
        &self,
        name: &str,
        range: Range<usize>,
        decode: impl Fn(&Self, usize) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug!("{} section: chunks {:?}", name, range);
        range.map(|i| decode(self, i)).collect()
    }

    /// Every PC speaker sound of a layout
    pub fn read_pc_sounds(&self, layout: &SoundLayout) -> Result<Vec<PcSoundChunk>> {
        layout.validate(self.len())?;
        self.read_section("PC sound", layout.pc_sound_range(), Self::pc_sound)
    }

    /// Every Adlib sound effect of a layout
    pub fn read_adlib_sounds(&self, layout: &SoundLayout) -> Result<Vec<AdlibSoundChunk>> {
        layout.validate(self.len())?;
        self.read_section("Adlib sound", layout.adlib_sound_range(), Self::adlib_sound)
    }

    /// Every music stream of a layout
    pub fn read_music(&self, layout: &SoundLayout) -> Result<Vec<AdlibEventStream>> {
        layout.validate(self.len())?;
        self.read_section("music", layout.music_range(self.len()), Self::music)
    }
}
