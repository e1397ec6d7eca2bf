//! Operator phase generator.
//!
//! A 64-bit accumulator that wraps around once per cycle. The waveform index
//! is taken from its top bits.

use crate::resources::{tables, Tables, DETUNE, FNUM_COEF, MULTIPLIER_X2};
use crate::SampleRate;
use num_traits::float::Float;

#[derive(Debug, Clone)]
pub struct PhaseGenerator {
    sample_rate: SampleRate,
    tables: &'static Tables,

    vibrato_enabled: bool,
    vibrato_depth: usize,

    phase: u64,
    increment: u64,
}

impl PhaseGenerator {
    pub fn new(sample_rate: SampleRate) -> Self {
        Self {
            sample_rate,
            tables: tables(),
            vibrato_enabled: false,
            vibrato_depth: 0,
            phase: 0,
            increment: 0,
        }
    }

    #[inline]
    pub fn phase(&self) -> u64 {
        self.phase
    }

    /// Phase increment per sample without vibrato.
    #[inline]
    pub fn increment(&self) -> u64 {
        self.increment
    }

    /// Frequency in Hz the current increment corresponds to.
    pub fn frequency(&self) -> f64 {
        self.increment as f64 / 18446744073709551616.0 * self.sample_rate.sample_rate_hz
    }

    pub fn set_vibrato(&mut self, enabled: bool, depth: usize) {
        self.vibrato_enabled = enabled;
        self.vibrato_depth = depth & 3;
    }

    pub fn set_frequency(&mut self, fnum: u16, block: u8, bo: u8, mult: u8, dt: u8) {
        let ksn = key_scale_number(fnum, block);
        let octave = block as i32 + 3 - bo as i32;
        let base = fnum as f64 * 2f64.powi(octave) / (16.0 * FNUM_COEF);
        let frequency = base + DETUNE[dt as usize & 7][ksn];

        let increment = self.sample_rate.phase_increment(frequency) as u128;
        self.increment = ((increment * MULTIPLIER_X2[mult as usize & 15] as u128) >> 1) as u64;
    }

    #[inline]
    pub fn reset(&mut self) {
        self.phase = 0;
    }

    /// Advances by one sample and returns the new phase.
    #[inline]
    pub fn next(&mut self, vibrato_index: usize) -> u64 {
        let increment = if self.vibrato_enabled {
            let ratio = self.tables.vibrato[self.vibrato_depth][vibrato_index];
            (self.increment >> 32).wrapping_mul(ratio)
        } else {
            self.increment
        };

        self.phase = self.phase.wrapping_add(increment);
        self.phase
    }
}

/// Key scale number, 0..=15, from the frequency registers.
#[inline]
pub fn key_scale_number(fnum: u16, block: u8) -> usize {
    ((block as usize & 7) << 1) | ((fnum as usize >> 9) & 1)
}
