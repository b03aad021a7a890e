//! PC Speaker Synthesis
//!
//! The PC speaker is a one-bit output toggled by the 8253 timer. Sound effects
//! store one timer-period byte per 140 Hz tick; this module turns them into
//! unsigned 8-bit PCM at any output rate, reproducing the hard square edges of
//! the hardware.

use crate::chunk::PcSoundChunk;

/// 8253 programmable interval timer input clock (Hz)
pub const PC_BASE_TIMER: u32 = 1_193_181;
/// Square wave half-amplitude around the PCM midpoint
pub const PC_VOLUME: i32 = 20;
/// Tone bytes per second
pub const PC_RATE: u32 = 140;
/// Period byte to timer divisor scale
pub const PC_TONE_SCALE: u32 = 60;
/// Unsigned 8-bit silence
pub const PCM_MIDPOINT: u8 = 128;

/// PC speaker renderer for a fixed output rate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcSpeaker {
    sample_rate: u32,
}

impl PcSpeaker {
    /// Create a renderer producing `sample_rate` samples per second
    pub fn new(sample_rate: u32) -> Self {
        PcSpeaker { sample_rate }
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Samples emitted for each tone byte
    pub fn samples_per_byte(&self) -> usize {
        (self.sample_rate / PC_RATE) as usize
    }

    /// Total output length for a payload
    pub fn total_samples(&self, payload: &[u8]) -> usize {
        payload.len() * self.samples_per_byte()
    }

    /// Render a PC sound chunk
    pub fn render(&self, sound: &PcSoundChunk) -> Vec<u8> {
        self.render_payload(&sound.payload)
    }

    /// Render raw tone bytes to unsigned 8-bit PCM
    ///
    /// The speaker polarity and phase counter carry across tone bytes; a zero
    /// byte emits silence and restarts the phase.
    pub fn render_payload(&self, payload: &[u8]) -> Vec<u8> {
        let samples_per_byte = self.samples_per_byte();
        let mut out = Vec::with_capacity(self.total_samples(payload));

        let mut sign: i32 = -1;
        let mut phase_tic: u64 = 0;

        for &b in payload {
            let tone = b as u64 * PC_TONE_SCALE as u64;
            if tone == 0 {
                phase_tic = 0;
                out.resize(out.len() + samples_per_byte, PCM_MIDPOINT);
                continue;
            }

            let phase_length = self.sample_rate as u64 * tone / (2 * PC_BASE_TIMER as u64);
            for _ in 0..samples_per_byte {
                out.push((PCM_MIDPOINT as i32 + sign * PC_VOLUME) as u8);
                if phase_tic >= phase_length {
                    sign = -sign;
                    phase_tic = 0;
                } else {
                    phase_tic += 1;
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOW: u8 = 108;
    const HIGH: u8 = 148;

    #[test]
    fn test_output_length() {
        let speaker = PcSpeaker::new(44_100);
        assert_eq!(speaker.samples_per_byte(), 315);
        assert_eq!(speaker.render_payload(&[1, 0, 200]).len(), 945);
    }

    #[test]
    fn test_zero_byte_is_silence_at_any_rate() {
        for rate in [8_000, 11_025, 22_050, 44_100, 48_000] {
            let speaker = PcSpeaker::new(rate);
            let n = speaker.samples_per_byte();
            let pcm = speaker.render_payload(&[90, 0, 90]);
            assert!(
                pcm[n..2 * n].iter().all(|&s| s == PCM_MIDPOINT),
                "zero byte not silent at {} Hz",
                rate
            );
        }
    }

    #[test]
    fn test_square_wave_levels() {
        let pcm = PcSpeaker::new(44_100).render_payload(&[255]);
        assert!(pcm.iter().all(|&s| s == LOW || s == HIGH));
        assert_eq!(pcm[0], LOW);
        assert!(pcm.contains(&HIGH));
    }

    #[test]
    fn test_phase_length_toggles() {
        // 44100 * 120 / 2386362 = 2: two extra ticks before each flip
        let pcm = PcSpeaker::new(44_100).render_payload(&[2]);
        assert_eq!(&pcm[..9], &[LOW, LOW, LOW, HIGH, HIGH, HIGH, LOW, LOW, LOW]);
    }

    #[test]
    fn test_short_period_flips_every_sample() {
        // Phase length 0 at low rates: alternate each sample
        let pcm = PcSpeaker::new(8_000).render_payload(&[1]);
        assert_eq!(&pcm[..4], &[LOW, HIGH, LOW, HIGH]);
    }

    #[test]
    fn test_polarity_carries_across_bytes() {
        let speaker = PcSpeaker::new(8_000);
        let n = speaker.samples_per_byte();
        let pcm = speaker.render_payload(&[1, 1]);
        // 57 samples per byte with a flip after every sample: odd count leaves
        // the polarity inverted for the second byte
        assert_eq!(n % 2, 1);
        assert_eq!(pcm[n], pcm[n - 1] ^ LOW ^ HIGH);
    }

    #[test]
    fn test_deterministic() {
        let payload: Vec<u8> = (0..=255u8).cycle().take(600).collect();
        let speaker = PcSpeaker::new(22_050);
        assert_eq!(speaker.render_payload(&payload), speaker.render_payload(&payload));
    }

    #[test]
    fn test_rate_below_tick_rate_is_empty() {
        assert!(PcSpeaker::new(100).render_payload(&[5, 6, 7]).is_empty());
    }
}
