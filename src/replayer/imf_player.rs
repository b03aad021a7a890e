//! IMF Stream Player
//!
//! Faithful command replay: each event writes one register, lets the device
//! settle for one IMF tick and then holds for `delay` further ticks. The
//! player never looks at register semantics; timbre is entirely the device's
//! business, and determinism follows from the device being a pure function of
//! its write/pull history.

use log::debug;

use crate::backend::FmBackend;
use crate::chunk::{AdlibEventStream, AdlibSoundChunk};
use crate::Result;

/// IMF event clock (Hz)
pub const IMF_RATE: u32 = 700;

/// Renders IMF streams to signed 16-bit PCM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImfPlayer {
    sample_rate: u32,
}

impl ImfPlayer {
    /// Create a player producing `sample_rate` samples per second
    pub fn new(sample_rate: u32) -> Self {
        ImfPlayer { sample_rate }
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples emitted per IMF tick
    pub fn samples_per_event(&self) -> usize {
        (self.sample_rate / IMF_RATE) as usize
    }

    /// Exact output length for a stream
    pub fn total_samples(&self, stream: &AdlibEventStream) -> usize {
        stream.event_units() as usize * self.samples_per_event()
    }

    /// Replay a stream against a device
    ///
    /// The device is re-initialised at the player's sample rate first, so a
    /// backend can be reused across songs.
    pub fn render<B: FmBackend>(&self, stream: &AdlibEventStream, device: &mut B) -> Vec<i16> {
        device.init(self.sample_rate);

        let samples_per_event = self.samples_per_event();
        let total = self.total_samples(stream);
        let mut out = vec![0i16; total];
        debug!(
            "rendering {} events into {} samples at {} Hz",
            stream.events.len(),
            total,
            self.sample_rate
        );

        let mut pos = 0;
        for event in &stream.events {
            device.write_register(event.register, event.value);
            let span = samples_per_event * (1 + event.delay as usize);
            device.generate_samples_into(&mut out[pos..pos + span]);
            pos += span;
        }

        out
    }

    /// Render an Adlib sound effect through its compiled event stream
    pub fn render_sound<B: FmBackend>(
        &self,
        sound: &AdlibSoundChunk,
        device: &mut B,
    ) -> Result<Vec<i16>> {
        Ok(self.render(&sound.to_event_stream()?, device))
    }
}
