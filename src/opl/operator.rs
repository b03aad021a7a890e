//! OPL2 Operator
//!
//! One FM operator: a phase generator feeding a waveform lookup, scaled by
//! an ADSR envelope plus total level, key scale level and tremolo.

use std::f64::consts::TAU;

use bitflags::bitflags;
use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use super::tables::{
    attenuation_to_gain, rate_time_ms, ATTACK_TIME_MS, DECAY_TIME_MS, KSL_ROM, KSL_SHIFT,
    MAX_ATTENUATION, MULTIPLIER_TABLE, OPERATOR_FULL_SCALE, OPL_RATE,
};

bitflags! {
    /// Operator characteristic register (0x20-0x35) flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OperatorFlags: u8 {
        /// Tremolo (amplitude modulation)
        const AM = 0x80;
        /// Vibrato
        const VIB = 0x40;
        /// Sustained envelope (hold at sustain level while keyed)
        const EGT = 0x20;
        /// Key scale rate
        const KSR = 0x10;
    }
}

/// Operator waveform (register 0xE0-0xF5, needs waveform select enabled)
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum Waveform {
    /// Full sine
    Sine = 0,
    /// Positive half of the sine, silence for the negative half
    HalfSine = 1,
    /// Rectified sine
    AbsSine = 2,
    /// First quarter of each rectified half, silence for the rest
    QuarterSine = 3,
}

impl Waveform {
    /// Waveform for the low two register bits
    pub fn from_register(value: u8) -> Self {
        Waveform::from_u8(value & 0x03).unwrap_or(Waveform::Sine)
    }

    /// Sample the waveform at a phase in cycles
    pub fn sample(&self, phase: f64) -> f64 {
        let p = phase.rem_euclid(1.0);
        let s = (p * TAU).sin();
        match self {
            Waveform::Sine => s,
            Waveform::HalfSine => {
                if p < 0.5 {
                    s
                } else {
                    0.0
                }
            }
            Waveform::AbsSine => s.abs(),
            Waveform::QuarterSine => {
                if p.rem_euclid(0.5) < 0.25 {
                    s.abs()
                } else {
                    0.0
                }
            }
        }
    }
}

/// Envelope generator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Silent, not keyed
    Off,
    /// Rising towards 0 dB
    Attack,
    /// Falling towards the sustain level
    Decay,
    /// At the sustain level
    Sustain,
    /// Falling towards silence after key off
    Release,
}

/// Channel-wide parameters an operator depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelPitch {
    /// 10-bit F-number
    pub fnum: u16,
    /// Octave block (0-7)
    pub block: u8,
    /// Note select (register 0x08 bit 6)
    pub nts: bool,
}

impl ChannelPitch {
    /// Rate key code: block and one F-number bit chosen by NTS
    pub fn key_code(&self) -> u32 {
        let bit = if self.nts {
            (self.fnum >> 8) & 1
        } else {
            (self.fnum >> 9) & 1
        };
        ((self.block as u32) << 1) | bit as u32
    }

    /// Base frequency in Hz before the operator multiplier
    pub fn frequency(&self) -> f64 {
        self.fnum as f64 * OPL_RATE * (1u32 << self.block) as f64 / (1u32 << 20) as f64
    }
}

/// Single FM operator
#[derive(Debug, Clone)]
pub struct Operator {
    // Register state
    flags: OperatorFlags,
    multiplier: u8,
    ksl: u8,
    total_level: u8,
    attack_rate: u8,
    decay_rate: u8,
    sustain_level: u8,
    release_rate: u8,
    waveform: Waveform,

    // Derived per-sample values
    phase_step: f64,
    ksl_steps: f64,
    attack_factor: f64,
    decay_step: f64,
    release_step: f64,

    phase: f64,
    stage: EnvelopeStage,
    envelope: f64,
    keyed: bool,
}

impl Operator {
    /// Create a silent operator
    pub fn new() -> Self {
        Operator {
            flags: OperatorFlags::empty(),
            multiplier: 0,
            ksl: 0,
            total_level: 0,
            attack_rate: 0,
            decay_rate: 0,
            sustain_level: 0,
            release_rate: 0,
            waveform: Waveform::Sine,
            phase_step: 0.0,
            ksl_steps: 0.0,
            attack_factor: 1.0,
            decay_step: 0.0,
            release_step: 0.0,
            phase: 0.0,
            stage: EnvelopeStage::Off,
            envelope: MAX_ATTENUATION,
            keyed: false,
        }
    }

    /// Register 0x20-0x35: AM/VIB/EGT/KSR/MULT
    pub fn set_characteristic(&mut self, value: u8) {
        self.flags = OperatorFlags::from_bits_truncate(value);
        self.multiplier = value & 0x0F;
    }

    /// Register 0x40-0x55: KSL/TL
    pub fn set_level(&mut self, value: u8) {
        self.ksl = value >> 6;
        self.total_level = value & 0x3F;
    }

    /// Register 0x60-0x75: AR/DR
    pub fn set_attack_decay(&mut self, value: u8) {
        self.attack_rate = value >> 4;
        self.decay_rate = value & 0x0F;
    }

    /// Register 0x80-0x95: SL/RR
    pub fn set_sustain_release(&mut self, value: u8) {
        self.sustain_level = value >> 4;
        self.release_rate = value & 0x0F;
    }

    /// Register 0xE0-0xF5: waveform
    pub fn set_waveform(&mut self, value: u8) {
        self.waveform = Waveform::from_register(value);
    }

    /// Current envelope stage
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Operator flags
    pub fn flags(&self) -> OperatorFlags {
        self.flags
    }

    fn sustain_steps(&self) -> f64 {
        if self.sustain_level == 0x0F {
            496.0
        } else {
            self.sustain_level as f64 * 16.0
        }
    }

    fn effective_rate(&self, rate: u8, key_code: u32) -> u32 {
        if rate == 0 {
            return 0;
        }
        let ksr_offset = if self.flags.contains(OperatorFlags::KSR) {
            key_code
        } else {
            key_code >> 2
        };
        (rate as u32 * 4 + ksr_offset).min(63)
    }

    /// Recompute pitch, key scaling and envelope speeds
    ///
    /// Call after any register write that touches this operator or its
    /// channel's pitch.
    pub fn update(&mut self, pitch: ChannelPitch, sample_rate: u32) {
        let rate = sample_rate.max(1) as f64;
        self.phase_step = pitch.frequency() * MULTIPLIER_TABLE[self.multiplier as usize] / rate;

        let ksl =
            (KSL_ROM[(pitch.fnum >> 6) as usize & 0x0F] << 2) - ((8 - pitch.block as i32) << 5);
        self.ksl_steps = (ksl.max(0) >> KSL_SHIFT[self.ksl as usize]) as f64;

        let key_code = pitch.key_code();
        let samples = |time_ms: f64| (time_ms * rate / 1000.0).max(1.0);

        let attack = self.effective_rate(self.attack_rate, key_code);
        self.attack_factor = if attack >= 60 {
            0.0
        } else {
            match rate_time_ms(&ATTACK_TIME_MS, attack) {
                Some(t) => MAX_ATTENUATION.powf(-1.0 / samples(t)),
                None => 1.0,
            }
        };

        self.decay_step =
            rate_time_ms(&DECAY_TIME_MS, self.effective_rate(self.decay_rate, key_code))
                .map_or(0.0, |t| MAX_ATTENUATION / samples(t));
        self.release_step =
            rate_time_ms(&DECAY_TIME_MS, self.effective_rate(self.release_rate, key_code))
                .map_or(0.0, |t| MAX_ATTENUATION / samples(t));
    }

    /// Key on/off edge handling
    pub fn set_key(&mut self, on: bool) {
        if on && !self.keyed {
            self.phase = 0.0;
            self.stage = EnvelopeStage::Attack;
        } else if !on && self.keyed && self.stage != EnvelopeStage::Off {
            self.stage = EnvelopeStage::Release;
        }
        self.keyed = on;
    }

    fn advance_envelope(&mut self) {
        match self.stage {
            EnvelopeStage::Off => self.envelope = MAX_ATTENUATION,
            EnvelopeStage::Attack => {
                self.envelope *= self.attack_factor;
                if self.envelope < 0.5 {
                    self.envelope = 0.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                let target = self.sustain_steps();
                self.envelope += self.decay_step;
                if self.envelope >= target {
                    self.envelope = target;
                    self.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {
                if !self.flags.contains(OperatorFlags::EGT) {
                    self.envelope += self.release_step;
                    if self.envelope >= MAX_ATTENUATION {
                        self.envelope = MAX_ATTENUATION;
                        self.stage = EnvelopeStage::Off;
                    }
                }
            }
            EnvelopeStage::Release => {
                self.envelope += self.release_step;
                if self.envelope >= MAX_ATTENUATION {
                    self.envelope = MAX_ATTENUATION;
                    self.stage = EnvelopeStage::Off;
                }
            }
        }
    }

    /// Produce one output sample and advance phase and envelope
    ///
    /// * `modulation` - phase offset in cycles
    /// * `tremolo_steps` - attenuation from the tremolo LFO
    /// * `vibrato` - frequency ratio from the vibrato LFO
    /// * `waveform_select` - register 0x01 bit 5
    pub fn tick(
        &mut self,
        modulation: f64,
        tremolo_steps: f64,
        vibrato: f64,
        waveform_select: bool,
    ) -> f64 {
        let out = if self.stage == EnvelopeStage::Off {
            0.0
        } else {
            let mut attenuation = self.envelope + self.total_level as f64 * 4.0 + self.ksl_steps;
            if self.flags.contains(OperatorFlags::AM) {
                attenuation += tremolo_steps;
            }
            let waveform = if waveform_select {
                self.waveform
            } else {
                Waveform::Sine
            };
            waveform.sample(self.phase + modulation)
                * attenuation_to_gain(attenuation)
                * OPERATOR_FULL_SCALE
        };

        let step = if self.flags.contains(OperatorFlags::VIB) {
            self.phase_step * vibrato
        } else {
            self.phase_step
        };
        self.phase = (self.phase + step).fract();
        self.advance_envelope();

        out
    }
}

impl Default for Operator {
    fn default() -> Self {
        Self::new()
    }
}
