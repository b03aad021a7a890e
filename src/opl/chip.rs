//! YM3812 (OPL2) chip
//!
//! Nine two-operator channels mixed to a mono i16 stream, clocked directly at
//! the host sample rate. The chip is a pure function of its register-write
//! and sample-pull history, which keeps rendered songs reproducible.

use std::f64::consts::TAU;

use super::operator::{ChannelPitch, Operator};
use super::tables::{
    slot_to_operator, DB_PER_STEP, MODULATION_DEPTH, OPERATOR_FULL_SCALE, TREMOLO_DEPTH_DB,
    TREMOLO_RATE, VIBRATO_DEPTH_CENTS, VIBRATO_RATE,
};
use crate::backend::FmBackend;

const DEFAULT_SAMPLE_RATE: u32 = 44_100;
const CHANNEL_COUNT: usize = 9;

/// One melodic voice: modulator, carrier and their connection
#[derive(Debug, Clone, Default)]
struct Channel {
    ops: [Operator; 2],
    pitch: ChannelPitch,
    key_on: bool,
    feedback: u8,
    additive: bool,
    history: [f64; 2],
}

impl Channel {
    fn update(&mut self, sample_rate: u32) {
        for op in self.ops.iter_mut() {
            op.update(self.pitch, sample_rate);
        }
    }

    fn tick(&mut self, tremolo_steps: f64, vibrato: f64, waveform_select: bool) -> f64 {
        let feedback = if self.feedback > 0 {
            (self.history[0] + self.history[1]) * 2f64.powi(self.feedback as i32 - 7)
        } else {
            0.0
        };

        let modulator = self.ops[0].tick(feedback, tremolo_steps, vibrato, waveform_select);
        self.history[1] = self.history[0];
        self.history[0] = modulator / OPERATOR_FULL_SCALE;

        if self.additive {
            modulator + self.ops[1].tick(0.0, tremolo_steps, vibrato, waveform_select)
        } else {
            let phase_mod = modulator / OPERATOR_FULL_SCALE * MODULATION_DEPTH;
            self.ops[1].tick(phase_mod, tremolo_steps, vibrato, waveform_select)
        }
    }
}

/// YM3812 emulator implementing [`FmBackend`]
#[derive(Debug, Clone)]
pub struct Opl2 {
    sample_rate: u32,
    regs: [u8; 256],
    channels: [Channel; CHANNEL_COUNT],
    waveform_select: bool,
    note_select: bool,
    deep_tremolo: bool,
    deep_vibrato: bool,
    rhythm: bool,
    tremolo_phase: f64,
    vibrato_phase: f64,
}

impl Opl2 {
    /// Create a chip producing `sample_rate` samples per second
    pub fn new(sample_rate: u32) -> Self {
        let mut chip = Opl2 {
            sample_rate,
            regs: [0; 256],
            channels: Default::default(),
            waveform_select: false,
            note_select: false,
            deep_tremolo: false,
            deep_vibrato: false,
            rhythm: false,
            tremolo_phase: 0.0,
            vibrato_phase: 0.0,
        };
        chip.reset();
        chip
    }

    /// Reset all registers and voices, keeping the sample rate
    pub fn reset(&mut self) {
        self.regs = [0; 256];
        self.channels = Default::default();
        self.waveform_select = false;
        self.note_select = false;
        self.deep_tremolo = false;
        self.deep_vibrato = false;
        self.rhythm = false;
        self.tremolo_phase = 0.0;
        self.vibrato_phase = 0.0;
        for ch in self.channels.iter_mut() {
            ch.update(self.sample_rate);
        }
    }

    /// Output sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Last value written to a register
    pub fn read_register(&self, addr: u8) -> u8 {
        self.regs[addr as usize]
    }

    /// True when rhythm mode (register 0xBD bit 5) is enabled
    pub fn rhythm_mode(&self) -> bool {
        self.rhythm
    }

    fn write_reg(&mut self, addr: u8, value: u8) {
        self.regs[addr as usize] = value;

        match addr {
            0x01 => self.waveform_select = value & 0x20 != 0,
            0x08 => {
                self.note_select = value & 0x40 != 0;
                for ch in self.channels.iter_mut() {
                    ch.pitch.nts = self.note_select;
                    ch.update(self.sample_rate);
                }
            }
            0x20..=0x35 | 0x40..=0x55 | 0x60..=0x75 | 0x80..=0x95 | 0xE0..=0xF5 => {
                let Some((ch, op)) = slot_to_operator(addr & 0x1F) else {
                    return;
                };
                let channel = &mut self.channels[ch];
                let operator = &mut channel.ops[op];
                match addr & 0xE0 {
                    0x20 => operator.set_characteristic(value),
                    0x40 => operator.set_level(value),
                    0x60 => operator.set_attack_decay(value),
                    0x80 => operator.set_sustain_release(value),
                    0xE0 => operator.set_waveform(value),
                    _ => {}
                }
                channel.update(self.sample_rate);
            }
            0xA0..=0xA8 => {
                let channel = &mut self.channels[(addr - 0xA0) as usize];
                channel.pitch.fnum = (channel.pitch.fnum & 0x300) | value as u16;
                channel.update(self.sample_rate);
            }
            0xB0..=0xB8 => {
                let channel = &mut self.channels[(addr - 0xB0) as usize];
                channel.pitch.fnum = (channel.pitch.fnum & 0xFF) | ((value as u16 & 0x03) << 8);
                channel.pitch.block = (value >> 2) & 0x07;
                channel.update(self.sample_rate);

                let key_on = value & 0x20 != 0;
                for op in channel.ops.iter_mut() {
                    op.set_key(key_on);
                }
                channel.key_on = key_on;
            }
            0xBD => {
                self.deep_tremolo = value & 0x80 != 0;
                self.deep_vibrato = value & 0x40 != 0;
                // Rhythm mode is tracked only; the percussion voices are not synthesized
                self.rhythm = value & 0x20 != 0;
            }
            0xC0..=0xC8 => {
                let channel = &mut self.channels[(addr - 0xC0) as usize];
                channel.feedback = (value >> 1) & 0x07;
                channel.additive = value & 0x01 != 0;
            }
            _ => {}
        }
    }

    /// Compute the next mixed sample
    pub fn compute_next_sample(&mut self) -> i16 {
        let rate = self.sample_rate.max(1) as f64;

        let tremolo_lfo = 1.0 - (2.0 * self.tremolo_phase - 1.0).abs();
        let tremolo_steps =
            tremolo_lfo * TREMOLO_DEPTH_DB[self.deep_tremolo as usize] / DB_PER_STEP;

        let vibrato_lfo = (self.vibrato_phase * TAU).sin();
        let vibrato =
            2f64.powf(vibrato_lfo * VIBRATO_DEPTH_CENTS[self.deep_vibrato as usize] / 1200.0);

        self.tremolo_phase = (self.tremolo_phase + TREMOLO_RATE / rate).fract();
        self.vibrato_phase = (self.vibrato_phase + VIBRATO_RATE / rate).fract();

        let wse = self.waveform_select;
        let mix: f64 = self
            .channels
            .iter_mut()
            .map(|ch| ch.tick(tremolo_steps, vibrato, wse))
            .sum();

        mix.round().clamp(i16::MIN as f64, i16::MAX as f64) as i16
    }
}

impl Default for Opl2 {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl FmBackend for Opl2 {
    fn init(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.reset();
    }

    fn write_register(&mut self, addr: u8, value: u8) {
        self.write_reg(addr, value);
    }

    fn get_sample(&mut self) -> i16 {
        self.compute_next_sample()
    }
}
