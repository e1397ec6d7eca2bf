//! Operator envelope generator.
//!
//! Levels are linear amplitudes. The attack segment rises linearly, all other
//! segments decay exponentially, i.e. linearly in dB, with slopes taken from
//! the chip's rate tables.

#[allow(unused_imports)]
use num_traits::float::Float;

use crate::resources::{tables, Tables, DECAY_DB_PER_SEC_AT_4, RATE_OFFSET};
use crate::SampleRate;

/// Level below which a decaying envelope is considered silent.
pub const SILENCE: f64 = 1.0 / 32768.0;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Attack,
    Decay,
    Sustain,
    Release,

    #[default]
    Off,
}

#[derive(Debug, Clone)]
pub struct EnvelopeGenerator {
    sample_rate: SampleRate,
    tables: &'static Tables,

    stage: Stage,
    level: f64,

    tremolo_enabled: bool,
    tremolo_depth: usize,

    actual_attack_rate: u8,
    attack_increment: f64,
    decay_coefficient: f64,
    sustain_coefficient: f64,
    release_coefficient: f64,
    sustain_level: f64,

    ksl_coefficient: f64,
    tl_coefficient: f64,
}

impl EnvelopeGenerator {
    pub fn new(sample_rate: SampleRate) -> Self {
        Self {
            sample_rate,
            tables: tables(),
            stage: Stage::Off,
            level: 0.0,
            tremolo_enabled: false,
            tremolo_depth: 0,
            actual_attack_rate: 0,
            attack_increment: 0.0,
            decay_coefficient: 1.0,
            sustain_coefficient: 1.0,
            release_coefficient: 1.0,
            sustain_level: 1.0,
            ksl_coefficient: 1.0,
            tl_coefficient: 1.0,
        }
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Raw envelope level in [0, 1].
    #[inline]
    pub fn level(&self) -> f64 {
        self.level
    }

    /// Upper bound of the output, set by total level and key scale level.
    #[inline]
    pub fn ceiling(&self) -> f64 {
        self.ksl_coefficient * self.tl_coefficient
    }

    /// Attack rate after key scaling, 0..=63.
    #[inline]
    pub fn actual_attack_rate(&self) -> u8 {
        self.actual_attack_rate
    }

    pub fn set_tremolo(&mut self, enabled: bool, depth: usize) {
        self.tremolo_enabled = enabled;
        self.tremolo_depth = depth & 3;
    }

    pub fn set_total_level(&mut self, tl: u8) {
        self.tl_coefficient = 10f64.powf(-0.75 * tl as f64 / 20.0);
    }

    pub fn set_key_scale_level(&mut self, fnum: u16, block: u8, ksl: u8) {
        self.ksl_coefficient =
            self.tables.ksl[ksl as usize & 3][block as usize & 7][(fnum as usize >> 5) & 31];
    }

    pub fn set_attack_rate(&mut self, ar: u8, ksr: bool, ksn: usize) {
        let rate = ar as usize * 4 + RATE_OFFSET[ksr as usize][ksn & 15] as usize;
        self.actual_attack_rate = rate.min(63) as u8;

        self.attack_increment = if self.actual_attack_rate == 0 {
            0.0
        } else {
            let seconds = 1.75 * 0.5f64.powf(self.actual_attack_rate as f64 / 4.0 - 1.0);
            1.0 / (seconds * self.sample_rate.sample_rate_hz)
        };
    }

    pub fn set_decay_rate(&mut self, dr: u8, ksr: bool, ksn: usize) {
        self.decay_coefficient = self.decay_coefficient_for(dr, ksr, ksn);
    }

    pub fn set_sustain_rate(&mut self, sr: u8, ksr: bool, ksn: usize) {
        self.sustain_coefficient = self.decay_coefficient_for(sr, ksr, ksn);
    }

    pub fn set_release_rate(&mut self, rr: u8, ksr: bool, ksn: usize) {
        self.release_coefficient = self.decay_coefficient_for(rr, ksr, ksn);
    }

    pub fn set_sustain_level(&mut self, sl: u8) {
        self.sustain_level = if sl >= 15 {
            0.0
        } else {
            10f64.powf(-3.0 * sl as f64 / 20.0)
        };
    }

    #[inline]
    pub fn key_on(&mut self) {
        self.stage = Stage::Attack;
    }

    #[inline]
    pub fn key_off(&mut self) {
        if self.stage != Stage::Off {
            self.stage = Stage::Release;
        }
    }

    /// Forces the envelope into the terminal stage.
    #[inline]
    pub fn stop(&mut self) {
        self.stage = Stage::Off;
    }

    /// Advances by one sample and returns the output amplitude.
    #[inline]
    pub fn next(&mut self, tremolo_index: usize) -> f64 {
        if self.stage == Stage::Attack {
            self.level += self.attack_increment;
            if self.level >= 1.0 {
                self.level = 1.0;
                self.stage = Stage::Decay;
            }
        }

        if self.stage == Stage::Decay {
            if self.level > self.sustain_level.max(SILENCE) {
                self.level *= self.decay_coefficient;
            } else {
                self.stage = Stage::Sustain;
            }
        }

        match self.stage {
            Stage::Sustain => self.decay(self.sustain_coefficient),
            Stage::Release => self.decay(self.release_coefficient),
            _ => {}
        }

        let mut amplitude = self.level * self.ksl_coefficient * self.tl_coefficient;

        if self.tremolo_enabled {
            amplitude *= self.tables.tremolo[self.tremolo_depth][tremolo_index];
        }

        amplitude
    }

    #[inline]
    fn decay(&mut self, coefficient: f64) {
        if self.level > SILENCE {
            self.level *= coefficient;
        } else {
            self.stage = Stage::Off;
        }
    }

    fn decay_coefficient_for(&self, rate: u8, ksr: bool, ksn: usize) -> f64 {
        if rate == 0 {
            return 1.0;
        }

        let db_per_sample = DECAY_DB_PER_SEC_AT_4[ksr as usize][ksn & 15] / 2.0
            * (1u32 << (rate & 15)) as f64
            / 16.0
            * self.sample_rate.inv_sr;

        10f64.powf(-db_per_sample / 10.0)
    }
}
