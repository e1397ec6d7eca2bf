//! Vibrato and tremolo LFO tables.

use alloc::boxed::Box;
use alloc::vec;

#[allow(unused_imports)]
use num_traits::float::Float;

use super::MOD_TABLE_LEN;

/// Vibrato depth in cents by DVB register.
pub const VIBRATO_DEPTH_CENTS: [f64; 4] = [3.4, 6.7, 13.5, 26.8];

/// Tremolo depth in dB by DAM register.
pub const TREMOLO_DEPTH_DB: [f64; 4] = [1.3, 2.8, 5.8, 11.8];

pub fn vibrato_table() -> Box<[[u64; MOD_TABLE_LEN]]> {
    let mut table = vec![[0u64; MOD_TABLE_LEN]; VIBRATO_DEPTH_CENTS.len()].into_boxed_slice();

    for (row, depth) in table.iter_mut().zip(VIBRATO_DEPTH_CENTS) {
        for (i, value) in row.iter_mut().enumerate() {
            let cents = triangle_sine(i as f64 / MOD_TABLE_LEN as f64) * depth;
            let ratio = 2f64.powf(cents / 1200.0);
            *value = (ratio * 4294967296.0) as u64;
        }
    }

    table
}

pub fn tremolo_table() -> Box<[[f64; MOD_TABLE_LEN]]> {
    let mut table = vec![[0.0; MOD_TABLE_LEN]; TREMOLO_DEPTH_DB.len()].into_boxed_slice();

    for (row, depth) in table.iter_mut().zip(TREMOLO_DEPTH_DB) {
        for (i, value) in row.iter_mut().enumerate() {
            let db = (triangle_cosine(i as f64 / MOD_TABLE_LEN as f64) - 1.0) * 0.5 * depth;
            *value = 10f64.powf(db / 20.0);
        }
    }

    table
}

/// Triangle wave in sine phase, `phase` in [0, 1).
#[inline]
pub fn triangle_sine(phase: f64) -> f64 {
    let p = phase * 4.0;

    if p < 1.0 {
        p
    } else if p < 3.0 {
        2.0 - p
    } else {
        p - 4.0
    }
}

/// Triangle wave in cosine phase, `phase` in [0, 1).
#[inline]
pub fn triangle_cosine(phase: f64) -> f64 {
    let p = phase * 4.0;

    if p < 2.0 {
        1.0 - p
    } else {
        p - 3.0
    }
}
