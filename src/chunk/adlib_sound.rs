//! Adlib Sound Effect Chunks
//!
//! Format (little-endian):
//! - u32 note count, u16 priority
//! - 16-byte two-operator instrument
//! - u8 octave block
//! - note bytes: one F-number low byte per 140 Hz tick (0 = key off)
//!
//! Sound effects always play on OPL2 channel 0. [`AdlibSoundChunk::to_event_stream`]
//! compiles one into an IMF stream so the music player can render it.

use nom::bytes::complete::take;
use nom::number::complete::{le_u16, le_u32, u8 as byte};
use nom::sequence::tuple;

use super::imf::{AdlibEvent, AdlibEventStream};
use crate::container::ParseResult;
use crate::replayer::IMF_RATE;
use crate::{Result, WolfSoundsError};

/// Note bytes per second
pub const ADLIB_SOUND_RATE: u32 = 140;
/// IMF ticks covered by one note byte
pub const IMF_TICKS_PER_NOTE: u16 = (IMF_RATE / ADLIB_SOUND_RATE) as u16;
/// Fixed bytes before the note data
pub const ADLIB_SOUND_HEADER_SIZE: usize = 23;
/// Encoded instrument size
pub const INSTRUMENT_SIZE: usize = 16;

// Channel 0 operator register bases
const MODULATOR: u8 = 0x00;
const CARRIER: u8 = 0x03;
const REG_WAVE_SELECT: u8 = 0x01;
const REG_CHAR: u8 = 0x20;
const REG_SCALE: u8 = 0x40;
const REG_ATTACK: u8 = 0x60;
const REG_SUSTAIN: u8 = 0x80;
const REG_FREQ_LO: u8 = 0xA0;
const REG_FREQ_HI: u8 = 0xB0;
const REG_EFFECTS: u8 = 0xBD;
const REG_FEED_CON: u8 = 0xC0;
const REG_WAVE: u8 = 0xE0;
const KEY_ON: u8 = 0x20;

/// Two-operator instrument patch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Instrument {
    /// Modulator AM/VIB/EGT/KSR/MULT
    pub m_char: u8,
    /// Carrier AM/VIB/EGT/KSR/MULT
    pub c_char: u8,
    /// Modulator KSL/TL
    pub m_scale: u8,
    /// Carrier KSL/TL
    pub c_scale: u8,
    /// Modulator AR/DR
    pub m_attack: u8,
    /// Carrier AR/DR
    pub c_attack: u8,
    /// Modulator SL/RR
    pub m_sus: u8,
    /// Carrier SL/RR
    pub c_sus: u8,
    /// Modulator waveform
    pub m_wave: u8,
    /// Carrier waveform
    pub c_wave: u8,
    /// Feedback/connection (not applied to sound effects)
    pub n_conn: u8,
    /// Voice number
    pub voice: u8,
    /// Melodic/percussive mode
    pub mode: u8,
    /// Padding
    pub unused: [u8; 3],
}

impl Instrument {
    fn from_bytes(b: &[u8]) -> Self {
        Instrument {
            m_char: b[0],
            c_char: b[1],
            m_scale: b[2],
            c_scale: b[3],
            m_attack: b[4],
            c_attack: b[5],
            m_sus: b[6],
            c_sus: b[7],
            m_wave: b[8],
            c_wave: b[9],
            n_conn: b[10],
            voice: b[11],
            mode: b[12],
            unused: [b[13], b[14], b[15]],
        }
    }

    /// Register writes that load this patch onto channel 0
    pub fn setup_events(&self) -> Vec<AdlibEvent> {
        vec![
            AdlibEvent::new(REG_WAVE_SELECT, 0x20, 0),
            AdlibEvent::new(REG_EFFECTS, 0x00, 0),
            AdlibEvent::new(REG_CHAR + MODULATOR, self.m_char, 0),
            AdlibEvent::new(REG_SCALE + MODULATOR, self.m_scale, 0),
            AdlibEvent::new(REG_ATTACK + MODULATOR, self.m_attack, 0),
            AdlibEvent::new(REG_SUSTAIN + MODULATOR, self.m_sus, 0),
            AdlibEvent::new(REG_WAVE + MODULATOR, self.m_wave, 0),
            AdlibEvent::new(REG_CHAR + CARRIER, self.c_char, 0),
            AdlibEvent::new(REG_SCALE + CARRIER, self.c_scale, 0),
            AdlibEvent::new(REG_ATTACK + CARRIER, self.c_attack, 0),
            AdlibEvent::new(REG_SUSTAIN + CARRIER, self.c_sus, 0),
            AdlibEvent::new(REG_WAVE + CARRIER, self.c_wave, 0),
            AdlibEvent::new(REG_FEED_CON, 0x00, 0),
        ]
    }
}

/// Decoded Adlib sound effect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdlibSoundChunk {
    /// Chunk index within the AUDIOT file
    pub index: usize,
    /// Declared number of note bytes
    pub tone_length: u32,
    /// Playback priority used by the game's sound manager
    pub priority: u16,
    /// Patch played on channel 0
    pub instrument: Instrument,
    /// Octave block (0-7)
    pub block: u8,
    /// F-number low bytes, one per tick
    pub payload: Vec<u8>,
}

fn header(input: &[u8]) -> ParseResult<'_, (u32, u16, &[u8], u8)> {
    tuple((le_u32, le_u16, take(INSTRUMENT_SIZE), byte))(input)
}

impl AdlibSoundChunk {
    /// Decode an Adlib sound effect from its chunk bytes
    pub fn parse(index: usize, bytes: &[u8]) -> Result<Self> {
        let (rest, (tone_length, priority, instrument, block)) =
            header(bytes).map_err(|_| {
                WolfSoundsError::invalid_length(
                    index,
                    format!(
                        "Adlib sound header needs {} bytes, chunk holds {}",
                        ADLIB_SOUND_HEADER_SIZE,
                        bytes.len()
                    ),
                )
            })?;

        if tone_length as usize > rest.len() {
            return Err(WolfSoundsError::invalid_length(
                index,
                format!(
                    "Adlib sound declares {} note bytes but only {} remain in the chunk",
                    tone_length,
                    rest.len()
                ),
            ));
        }

        Ok(AdlibSoundChunk {
            index,
            tone_length,
            priority,
            instrument: Instrument::from_bytes(instrument),
            block,
            payload: rest[..tone_length as usize].to_vec(),
        })
    }

    /// Compile to an IMF stream on channel 0
    ///
    /// Every note byte spans exactly [`IMF_TICKS_PER_NOTE`] event units and a
    /// final key-off closes the sound. Fails with
    /// [`WolfSoundsError::InvalidLength`] when the compiled stream would not
    /// fit an IMF event block.
    pub fn to_event_stream(&self) -> Result<AdlibEventStream> {
        let block_bits = ((self.block & 7) << 2) | KEY_ON;
        let hold = IMF_TICKS_PER_NOTE;

        let mut events = self.instrument.setup_events();
        events.reserve(self.payload.len() * 2 + 1);
        for &note in &self.payload {
            if note == 0 {
                events.push(AdlibEvent::new(REG_FREQ_HI, 0, hold - 1));
            } else {
                events.push(AdlibEvent::new(REG_FREQ_LO, note, 0));
                events.push(AdlibEvent::new(REG_FREQ_HI, block_bits, hold - 2));
            }
        }
        events.push(AdlibEvent::new(REG_FREQ_HI, 0, 0));

        AdlibEventStream::from_events(self.index, events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(block: u8, notes: &[u8]) -> Vec<u8> {
        let mut out = (notes.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(&100u16.to_le_bytes());
        out.extend_from_slice(&[
            0x01, 0x11, 0x10, 0x00, 0xF0, 0xF4, 0x77, 0x55, 0x00, 0x01, 0x06, 0, 0, 0, 0, 0,
        ]);
        out.push(block);
        out.extend_from_slice(notes);
        out
    }

    #[test]
    fn test_parse_fields() {
        let sound = AdlibSoundChunk::parse(0, &chunk(4, &[0x80, 0, 0x90])).unwrap();
        assert_eq!(sound.index, 0);
        assert_eq!(sound.tone_length, 3);
        assert_eq!(sound.priority, 100);
        assert_eq!(sound.block, 4);
        assert_eq!(sound.instrument.m_char, 0x01);
        assert_eq!(sound.instrument.c_char, 0x11);
        assert_eq!(sound.instrument.c_wave, 0x01);
        assert_eq!(sound.instrument.n_conn, 0x06);
        assert_eq!(sound.payload, vec![0x80, 0, 0x90]);
    }

    #[test]
    fn test_notes_beyond_chunk() {
        let mut bytes = chunk(4, &[1, 2, 3]);
        bytes.pop();
        assert!(matches!(
            AdlibSoundChunk::parse(2, &bytes),
            Err(WolfSoundsError::InvalidLength { chunk: 2, .. })
        ));
    }

    #[test]
    fn test_header_too_short() {
        assert!(matches!(
            AdlibSoundChunk::parse(6, &[0u8; 22]),
            Err(WolfSoundsError::InvalidLength { chunk: 6, .. })
        ));
    }

    #[test]
    fn test_compiled_stream_timing() {
        let sound = AdlibSoundChunk::parse(0, &chunk(3, &[0x80, 0, 0x90, 0x90])).unwrap();
        let stream = sound.to_event_stream().unwrap();
        let setup = sound.instrument.setup_events().len() as u64;

        assert_eq!(
            stream.event_units(),
            setup + IMF_TICKS_PER_NOTE as u64 * 4 + 1
        );
        assert_eq!(stream.events.last(), Some(&AdlibEvent::new(0xB0, 0, 0)));
    }

    #[test]
    fn test_compiled_stream_keys_channel_zero() {
        let sound = AdlibSoundChunk::parse(0, &chunk(5, &[0x41])).unwrap();
        let stream = sound.to_event_stream().unwrap();
        let notes: Vec<_> = stream
            .events
            .iter()
            .filter(|e| e.register == 0xA0 || e.register == 0xB0)
            .copied()
            .collect();

        assert_eq!(
            notes,
            vec![
                AdlibEvent::new(0xA0, 0x41, 0),
                AdlibEvent::new(0xB0, 0x20 | (5 << 2), 3),
                AdlibEvent::new(0xB0, 0, 0),
            ]
        );
    }

    #[test]
    fn test_longest_compilable_sound() {
        // 13 setup writes, 2 per note, 1 per rest, closing key-off
        let mut notes = vec![0x44u8; 8184];
        notes.push(0);
        let sound = AdlibSoundChunk::parse(0, &chunk(4, &notes)).unwrap();
        let stream = sound.to_event_stream().unwrap();
        assert_eq!(stream.events.len() * 4, stream.event_bytes as usize);
        assert_eq!(stream.event_bytes, 65532);
    }

    #[test]
    fn test_sound_too_long_to_compile() {
        let notes = vec![0x44u8; 8185];
        let sound = AdlibSoundChunk::parse(12, &chunk(4, &notes)).unwrap();
        assert!(matches!(
            sound.to_event_stream(),
            Err(WolfSoundsError::InvalidLength { chunk: 12, .. })
        ));
    }
}
