//! Audio Export
//!
//! Writes rendered PCM buffers to disk as canonical mono PCM WAV files.

pub mod wav;

pub use wav::{export_pcm16, export_pcm8, write_pcm16, write_pcm8};
