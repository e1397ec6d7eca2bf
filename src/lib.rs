#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod chip;
pub mod controller;
pub mod fm;
pub mod resources;
pub mod voice;

/// Number of synthesis channels on the chip.
pub const CHANNEL_COUNT: usize = 16;

/// Number of MIDI channels handled by the controller.
pub const MIDI_CHANNEL_COUNT: usize = 16;

/// Number of operators per channel.
pub const OPERATOR_COUNT: usize = 4;

/// Sample rate the chip timing constants refer to.
pub const NATIVE_SAMPLE_RATE: f64 = 48000.0;

/// Sample rate context for DSP calculations.
#[derive(Debug, Clone, Copy)]
pub struct SampleRate {
    /// Sample rate in Hz
    pub sample_rate_hz: f64,
    /// Reciprocal of sample rate (1.0 / sample_rate_hz) for fast multiplication
    pub inv_sr: f64,
    /// Weight of the newest sample in the two-sample feedback blend
    pub feedback_weight: f64,
}

impl SampleRate {
    /// Create a new sample rate context.
    pub fn new(sample_rate_hz: f64) -> Self {
        let inv_sr = 1.0 / sample_rate_hz;

        // Keeps the mean feedback delay at 1.5 samples of the native rate,
        // which is 0.5 at 48 kHz.
        let feedback_weight = (2.0 - 1.5 * sample_rate_hz / NATIVE_SAMPLE_RATE).clamp(0.0, 1.0);

        Self {
            sample_rate_hz,
            inv_sr,
            feedback_weight,
        }
    }

    /// Returns a 64-bit phase increment for a frequency in Hz.
    #[inline]
    pub fn phase_increment(&self, frequency: f64) -> u64 {
        // Saturating float to int cast keeps negative frequencies at 0.
        (frequency * self.inv_sr * 18446744073709551616.0) as u64
    }
}
