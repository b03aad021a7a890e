//! YM3812 (OPL2) Emulation Domain
//!
//! Built-in FM backend for Adlib sound effects and IMF music.
//!
//! Register map handled:
//! - `0x01`: waveform select enable
//! - `0x08`: note select
//! - `0x20-0x35`: AM/VIB/EGT/KSR/MULT
//! - `0x40-0x55`: KSL/TL
//! - `0x60-0x75`: AR/DR
//! - `0x80-0x95`: SL/RR
//! - `0xA0-0xA8`, `0xB0-0xB8`: F-number, block, key on
//! - `0xBD`: tremolo/vibrato depth
//! - `0xC0-0xC8`: feedback and connection
//! - `0xE0-0xF5`: waveform

pub mod chip;
pub mod operator;
pub mod tables;

pub use chip::Opl2;
pub use operator::{EnvelopeStage, Operator, OperatorFlags, Waveform};
