//! IMF Event Streams
//!
//! Adlib music chunks hold a captured OPL2 register-write trace:
//! - u16 event byte count
//! - events: (u8 register, u8 value, u16 delay in 700 Hz ticks)
//! - trailing bytes up to the chunk end, kept verbatim
//!
//! The trailing bytes historically carry loop and tag metadata; they are
//! passed through without interpretation.

use std::io::{Read, Seek};

use nom::combinator::map;
use nom::multi::count;
use nom::number::complete::{le_u16, u8 as byte};
use nom::sequence::tuple;

use super::read_chunk;
use crate::container::{IndexEntry, ParseResult};
use crate::{Result, WolfSoundsError};

/// Size of one encoded event
pub const IMF_EVENT_SIZE: usize = 4;
/// Size of the event byte count field
const EVENT_BYTES_FIELD: usize = 2;
/// Most events a u16 event byte count can describe
pub const MAX_IMF_EVENTS: usize = u16::MAX as usize / IMF_EVENT_SIZE;

/// One register write followed by a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdlibEvent {
    /// OPL2 register address
    pub register: u8,
    /// Value written to the register
    pub value: u8,
    /// Ticks to hold before the next event
    pub delay: u16,
}

impl AdlibEvent {
    /// Create an event
    pub fn new(register: u8, value: u8, delay: u16) -> Self {
        AdlibEvent {
            register,
            value,
            delay,
        }
    }
}

/// Decoded IMF stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdlibEventStream {
    /// Declared size of the event block in bytes
    pub event_bytes: u16,
    /// Register writes in playback order
    pub events: Vec<AdlibEvent>,
    /// Bytes after the event block, uninterpreted
    pub trailing: Vec<u8>,
}

fn event_block(input: &[u8], n: usize) -> ParseResult<'_, Vec<AdlibEvent>> {
    count(
        map(tuple((byte, byte, le_u16)), |(register, value, delay)| {
            AdlibEvent::new(register, value, delay)
        }),
        n,
    )(input)
}

impl AdlibEventStream {
    /// Build a stream from events with no trailing data
    ///
    /// Fails with [`WolfSoundsError::InvalidLength`] for chunk `index` when the
    /// events do not fit the u16 event byte count.
    pub fn from_events(index: usize, events: Vec<AdlibEvent>) -> Result<Self> {
        if events.len() > MAX_IMF_EVENTS {
            return Err(WolfSoundsError::invalid_length(
                index,
                format!(
                    "{} events exceed the {}-event limit of an IMF stream",
                    events.len(),
                    MAX_IMF_EVENTS
                ),
            ));
        }
        Ok(AdlibEventStream {
            event_bytes: (events.len() * IMF_EVENT_SIZE) as u16,
            events,
            trailing: Vec::new(),
        })
    }

    /// Decode an IMF stream from its chunk bytes
    pub fn parse(index: usize, bytes: &[u8]) -> Result<Self> {
        let (rest, event_bytes) = le_u16::<_, nom::error::Error<&[u8]>>(bytes).map_err(|_| {
            WolfSoundsError::invalid_length(
                index,
                format!("IMF chunk of {} bytes has no event count", bytes.len()),
            )
        })?;

        let declared = event_bytes as usize;
        if !declared.is_multiple_of(IMF_EVENT_SIZE) {
            return Err(WolfSoundsError::invalid_length(
                index,
                format!(
                    "IMF event block of {} bytes is not a whole number of {}-byte events",
                    declared, IMF_EVENT_SIZE
                ),
            ));
        }

        let trailing_len = bytes
            .len()
            .checked_sub(declared + EVENT_BYTES_FIELD)
            .ok_or_else(|| {
                WolfSoundsError::invalid_length(
                    index,
                    format!(
                        "IMF event block of {} bytes does not fit a {}-byte chunk",
                        declared,
                        bytes.len()
                    ),
                )
            })?;

        let (trailing, events) = event_block(rest, declared / IMF_EVENT_SIZE)
            .map_err(|e| WolfSoundsError::invalid_length(index, format!("IMF events: {}", e)))?;
        debug_assert_eq!(trailing.len(), trailing_len);

        Ok(AdlibEventStream {
            event_bytes,
            events,
            trailing: trailing.to_vec(),
        })
    }

    /// Sum of `1 + delay` over all events
    ///
    /// Each event occupies one settle tick plus its delay.
    pub fn event_units(&self) -> u64 {
        self.events.iter().map(|e| 1 + e.delay as u64).sum()
    }
}

/// Seek to a chunk and decode it as an IMF stream
pub fn parse_adlib_events<R: Read + Seek>(
    reader: &mut R,
    index: usize,
    entry: &IndexEntry,
) -> Result<AdlibEventStream> {
    let bytes = read_chunk(reader, index, entry)?;
    AdlibEventStream::parse(index, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(events: &[(u8, u8, u16)], trailing: &[u8]) -> Vec<u8> {
        let mut out = ((events.len() * 4) as u16).to_le_bytes().to_vec();
        for &(r, v, d) in events {
            out.push(r);
            out.push(v);
            out.extend_from_slice(&d.to_le_bytes());
        }
        out.extend_from_slice(trailing);
        out
    }

    #[test]
    fn test_parse_events_and_trailing() {
        let bytes = chunk(&[(0x20, 0x01, 0), (0xB0, 0x31, 350)], b"TAG");
        let stream = AdlibEventStream::parse(0, &bytes).unwrap();

        assert_eq!(stream.event_bytes, 8);
        assert_eq!(
            stream.events,
            vec![AdlibEvent::new(0x20, 0x01, 0), AdlibEvent::new(0xB0, 0x31, 350)]
        );
        assert_eq!(stream.trailing, b"TAG".to_vec());
        assert_eq!(stream.events.len() * 4, stream.event_bytes as usize);
        assert_eq!(stream.trailing.len(), bytes.len() - stream.event_bytes as usize - 2);
    }

    #[test]
    fn test_empty_stream() {
        let stream = AdlibEventStream::parse(0, &[0, 0]).unwrap();
        assert!(stream.events.is_empty());
        assert!(stream.trailing.is_empty());
    }

    #[test]
    fn test_negative_trailing_length() {
        let mut bytes = chunk(&[(1, 2, 3), (4, 5, 6)], &[]);
        bytes.truncate(bytes.len() - 1);
        let err = AdlibEventStream::parse(9, &bytes).unwrap_err();
        assert!(matches!(err, WolfSoundsError::InvalidLength { chunk: 9, .. }));
    }

    #[test]
    fn test_partial_event_block() {
        let bytes = [6u8, 0, 1, 2, 3, 0, 4, 5, 0, 0];
        assert!(matches!(
            AdlibEventStream::parse(0, &bytes),
            Err(WolfSoundsError::InvalidLength { .. })
        ));
    }

    #[test]
    fn test_missing_event_count() {
        assert!(matches!(
            AdlibEventStream::parse(4, &[1]),
            Err(WolfSoundsError::InvalidLength { chunk: 4, .. })
        ));
    }

    #[test]
    fn test_event_units() {
        let stream = AdlibEventStream::from_events(
            0,
            vec![AdlibEvent::new(0, 0, 0), AdlibEvent::new(0, 0, 4)],
        )
        .unwrap();
        assert_eq!(stream.event_units(), 6);
        assert_eq!(stream.event_bytes, 8);
    }

    #[test]
    fn test_event_count_limit() {
        let full = vec![AdlibEvent::new(0xB0, 0, 0); MAX_IMF_EVENTS];
        let stream = AdlibEventStream::from_events(1, full.clone()).unwrap();
        assert_eq!(stream.event_bytes, 65532);
        assert_eq!(stream.events.len() * 4, stream.event_bytes as usize);

        let mut over = full;
        over.push(AdlibEvent::new(0xB0, 0, 0));
        assert!(matches!(
            AdlibEventStream::from_events(1, over),
            Err(WolfSoundsError::InvalidLength { chunk: 1, .. })
        ));
    }
}
