//! YM3812 Hardware Constants
//!
//! Shared constants and lookup tables used across OPL2 components.
//! Attenuation is measured in envelope steps of 0.1875 dB; 511 steps is
//! the 96 dB floor where an operator is inaudible.

/// Internal sample rate of the chip (14.31818 MHz / 288)
pub const OPL_RATE: f64 = 14_318_180.0 / 288.0;

/// dB per attenuation step
pub const DB_PER_STEP: f64 = 0.1875;
/// Largest attenuation (silence)
pub const MAX_ATTENUATION: f64 = 511.0;
/// Peak operator output, matching the chip's 13-bit operator range
pub const OPERATOR_FULL_SCALE: f64 = 4095.0;
/// Carrier phase shift in cycles for a full-scale modulator
pub const MODULATION_DEPTH: f64 = 4.0;

/// Frequency multiplier for MULT register values (0 means x0.5)
pub const MULTIPLIER_TABLE: [f64; 16] = [
    0.5, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 10.0, 12.0, 12.0, 15.0, 15.0,
];

/// Key scale level ROM, indexed by the top four F-number bits
///
/// Values are in 0.75 dB units at block 8; each lower block subtracts 6 dB.
pub const KSL_ROM: [i32; 16] = [0, 32, 40, 45, 48, 51, 53, 55, 56, 58, 59, 60, 61, 62, 63, 64];

/// Right shift applied to the key scale attenuation per KSL setting
///
/// KSL 0: off, 1: 3 dB/oct, 2: 1.5 dB/oct, 3: 6 dB/oct
pub const KSL_SHIFT: [u32; 4] = [31, 1, 2, 0];

/// Attack time in ms (silence to full) for effective rates 4..=7
///
/// Every four rate steps halve the time.
pub const ATTACK_TIME_MS: [f64; 4] = [2826.24, 2260.99, 1884.16, 1615.36];

/// Decay/release time in ms (0 dB to 96 dB) for effective rates 4..=7
pub const DECAY_TIME_MS: [f64; 4] = [39280.64, 31416.32, 26173.44, 22446.08];

/// Tremolo LFO frequency (Hz)
pub const TREMOLO_RATE: f64 = 3.7;
/// Tremolo depth in dB for AM depth bit clear / set
pub const TREMOLO_DEPTH_DB: [f64; 2] = [1.0, 4.8];

/// Vibrato LFO frequency (Hz)
pub const VIBRATO_RATE: f64 = 6.1;
/// Vibrato depth in cents for VIB depth bit clear / set
pub const VIBRATO_DEPTH_CENTS: [f64; 2] = [7.0, 14.0];

/// Operator slot offset (low five register bits) to (channel, operator)
///
/// Offsets 0x06, 0x07, 0x0E, 0x0F and above 0x15 are unmapped.
pub fn slot_to_operator(slot: u8) -> Option<(usize, usize)> {
    if slot > 0x15 {
        return None;
    }
    let group = (slot / 8) as usize;
    let within = (slot % 8) as usize;
    if within > 5 {
        return None;
    }
    Some((group * 3 + within % 3, within / 3))
}

/// Effective duration of an envelope phase for a 0..=63 rate
///
/// Returns `None` for rate 0, which never advances.
pub fn rate_time_ms(table: &[f64; 4], rate: u32) -> Option<f64> {
    if rate < 4 {
        return None;
    }
    let rate = rate.min(63);
    Some(table[(rate & 3) as usize] / (1u32 << ((rate >> 2) - 1)) as f64)
}

/// Linear gain for an attenuation in envelope steps
#[inline]
pub fn attenuation_to_gain(steps: f64) -> f64 {
    10f64.powf(-steps.clamp(0.0, MAX_ATTENUATION) * DB_PER_STEP / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_slot_mapping() {
        assert_eq!(slot_to_operator(0x00), Some((0, 0)));
        assert_eq!(slot_to_operator(0x03), Some((0, 1)));
        assert_eq!(slot_to_operator(0x05), Some((2, 1)));
        assert_eq!(slot_to_operator(0x08), Some((3, 0)));
        assert_eq!(slot_to_operator(0x0B), Some((3, 1)));
        assert_eq!(slot_to_operator(0x12), Some((8, 0)));
        assert_eq!(slot_to_operator(0x15), Some((8, 1)));
        assert_eq!(slot_to_operator(0x06), None);
        assert_eq!(slot_to_operator(0x0F), None);
        assert_eq!(slot_to_operator(0x16), None);
    }

    #[test]
    fn test_rate_time_halves_every_four_steps() {
        let t4 = rate_time_ms(&DECAY_TIME_MS, 4).unwrap();
        let t8 = rate_time_ms(&DECAY_TIME_MS, 8).unwrap();
        assert_relative_eq!(t4, 39280.64);
        assert_relative_eq!(t8, t4 / 2.0);
        assert!(rate_time_ms(&DECAY_TIME_MS, 0).is_none());
        assert_relative_eq!(
            rate_time_ms(&DECAY_TIME_MS, 60).unwrap(),
            39280.64 / 16384.0
        );
    }

    #[test]
    fn test_attenuation_gain() {
        assert_relative_eq!(attenuation_to_gain(0.0), 1.0);
        // 32 steps = 6 dB
        assert_relative_eq!(attenuation_to_gain(32.0), 0.501187, epsilon = 1e-5);
        assert!(attenuation_to_gain(MAX_ATTENUATION) * OPERATOR_FULL_SCALE < 0.1);
    }
}
