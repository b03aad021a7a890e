//! Adlib Playback Engine
//!
//! Replays IMF register traces against an [`FmBackend`](crate::FmBackend).

pub mod imf_player;

pub use imf_player::{ImfPlayer, IMF_RATE};
