//! Wolfenstein 3D era sound extractor
//!
//! Parses the AUDIOHED/AUDIOT index/data pair and the VSWAP container of the
//! id Software engine family (Wolfenstein 3D, Spear of Destiny) and renders
//! the embedded sounds into uncompressed PCM.
//!
//! # Features
//! - AUDIOHED offset tables and VSWAP headers
//! - PC speaker sounds rendered through a 1193181 Hz timer emulation
//! - Adlib sound effects and IMF music replayed against an FM backend
//! - Raw 8-bit digitized sounds, per page or reassembled from the sound table
//! - Game layout table (WL1, WL6, SOD) with JSON overrides
//!
//! # Crate feature flags
//! - `opl` (default): built-in YM3812 (OPL2) backend (`opl`)
//! - `export-wav` (default): WAV export through `hound` (`export`)
//!
//! # Quick start
//! ```no_run
//! # #[cfg(feature = "opl")]
//! # {
//! use wolfsounds::archive::AudioArchive;
//! use wolfsounds::layout::GameVersion;
//! use wolfsounds::opl::Opl2;
//! use wolfsounds::replayer::ImfPlayer;
//!
//! let archive = AudioArchive::open("AUDIOHED.WL6", "AUDIOT.WL6").unwrap();
//! let layout = GameVersion::Wl6.layout();
//! let songs = archive.read_music(&layout).unwrap();
//!
//! let player = ImfPlayer::new(44_100);
//! let mut chip = Opl2::new(44_100);
//! let pcm = player.render(&songs[0], &mut chip);
//! # }
//! ```

#![warn(missing_docs)]

pub mod archive; // One-shot AUDIOT loading
pub mod backend; // FM device contract
pub mod chunk; // Chunk sub-parsers
pub mod container; // AUDIOHED / VSWAP indexes
#[cfg(feature = "export-wav")]
pub mod export; // WAV output
pub mod layout; // Game version table
#[cfg(feature = "opl")]
pub mod opl; // YM3812 emulation
pub mod pcspeaker; // PC speaker synthesis
pub mod replayer; // Adlib / IMF playback

/// Error types for container parsing and rendering
#[derive(thiserror::Error, Debug)]
pub enum WolfSoundsError {
    /// Index is too short or not a whole number of entries
    #[error("Truncated index: {reason}")]
    TruncatedIndex {
        /// What was missing
        reason: String,
    },

    /// A declared length does not fit the bytes available for a chunk
    #[error("Invalid length in chunk {chunk}: {reason}")]
    InvalidLength {
        /// Chunk index within its container
        chunk: usize,
        /// Which length was inconsistent
        reason: String,
    },

    /// Game version tag or layout not recognized
    #[error("Unsupported layout: {0}")]
    UnsupportedLayout(String),

    /// Error writing audio file
    #[error("Audio file write error: {0}")]
    AudioFileError(String),

    /// IO error from filesystem
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl WolfSoundsError {
    /// Shorthand for [`WolfSoundsError::TruncatedIndex`]
    pub fn truncated(reason: impl Into<String>) -> Self {
        WolfSoundsError::TruncatedIndex {
            reason: reason.into(),
        }
    }

    /// Shorthand for [`WolfSoundsError::InvalidLength`]
    pub fn invalid_length(chunk: usize, reason: impl Into<String>) -> Self {
        WolfSoundsError::InvalidLength {
            chunk,
            reason: reason.into(),
        }
    }

    /// Chunk index the error refers to, if any
    pub fn chunk(&self) -> Option<usize> {
        match self {
            WolfSoundsError::InvalidLength { chunk, .. } => Some(*chunk),
            _ => None,
        }
    }
}

/// Result type for extraction operations
pub type Result<T> = std::result::Result<T, WolfSoundsError>;

// Public API exports
pub use archive::AudioArchive;
pub use backend::FmBackend;
pub use chunk::{AdlibEvent, AdlibEventStream, AdlibSoundChunk, Instrument, PcSoundChunk};
pub use container::{parse_offset_table, parse_vswap_header, IndexEntry, VSwapContainer};
pub use layout::{GameVersion, LayoutTable, SoundLayout};
#[cfg(feature = "opl")]
pub use opl::Opl2;
pub use pcspeaker::PcSpeaker;
pub use replayer::ImfPlayer;
