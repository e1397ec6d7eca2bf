//! MA-5 waveform set.
//!
//! Slots are grouped in rows of eight. The first row is the sine family,
//! followed by clipped sine, triangle and saw rows, each with the same
//! half/abs/quarter/double-speed variants. Square and exponential waves
//! occupy the remaining slots of the first row; slots 15, 23 and 31 are
//! silent.

use alloc::boxed::Box;
use alloc::vec;

#[allow(unused_imports)]
use num_traits::float::Float;

use super::{WAVEFORM_COUNT, WAVEFORM_LEN};

type Wave = [f64; WAVEFORM_LEN];

const HALF: usize = WAVEFORM_LEN / 2;
const QUARTER: usize = WAVEFORM_LEN / 4;

pub fn waveform_table() -> Box<[Wave]> {
    let mut table = vec![[0.0; WAVEFORM_LEN]; WAVEFORM_COUNT].into_boxed_slice();

    let sine: Wave =
        core::array::from_fn(|i| (core::f64::consts::TAU * i as f64 / WAVEFORM_LEN as f64).sin());
    let clipped_sine = sine.map(|s| (s * core::f64::consts::SQRT_2).clamp(-1.0, 1.0));

    table[0] = sine;
    fill_variants(&mut table, 1, &sine);

    table[6] = square();
    table[7] = exponential();

    table[8] = clipped_sine;
    fill_variants(&mut table, 9, &clipped_sine);

    table[14] = half(&table[6]);
    table[22] = abs_quarter(&table[6]);
    table[30] = double_speed(&table[14]);

    let triangle = triangle();
    table[16] = triangle;
    fill_variants(&mut table, 17, &triangle);

    let saw = saw();
    table[24] = saw;
    fill_variants(&mut table, 25, &saw);

    table
}

/// Writes half, abs, abs-quarter, double-speed and abs-double-speed
/// variants of `source` to five consecutive slots.
fn fill_variants(table: &mut [Wave], first: usize, source: &Wave) {
    table[first] = half(source);
    table[first + 1] = abs(source);
    table[first + 2] = abs_quarter(source);
    table[first + 3] = double_speed(source);
    table[first + 4] = abs_double_speed(source);
}

fn half(source: &Wave) -> Wave {
    core::array::from_fn(|i| if i < HALF { source[i] } else { 0.0 })
}

fn abs(source: &Wave) -> Wave {
    core::array::from_fn(|i| source[i % HALF])
}

fn abs_quarter(source: &Wave) -> Wave {
    core::array::from_fn(|i| {
        if i % HALF < QUARTER {
            source[i % HALF]
        } else {
            0.0
        }
    })
}

fn double_speed(source: &Wave) -> Wave {
    core::array::from_fn(|i| if i < HALF { source[i * 2] } else { 0.0 })
}

fn abs_double_speed(source: &Wave) -> Wave {
    core::array::from_fn(|i| {
        if i < HALF {
            source[(i % QUARTER) * 2]
        } else {
            0.0
        }
    })
}

fn square() -> Wave {
    core::array::from_fn(|i| if i < HALF { 1.0 } else { -1.0 })
}

fn exponential() -> Wave {
    let mut wave = [0.0; WAVEFORM_LEN];

    for i in 0..HALF {
        let x = i as f64 * 16.0 / 256.0;
        wave[i] = 2f64.powf(-x);
        wave[WAVEFORM_LEN - 1 - i] = -2f64.powf(-(x + 1.0 / 16.0));
    }

    wave
}

fn triangle() -> Wave {
    core::array::from_fn(|i| {
        let q = QUARTER as f64;
        let j = (i % QUARTER) as f64;

        match i / QUARTER {
            0 => j / q,
            1 => (q - j) / q,
            2 => -j / q,
            _ => -(q - j) / q,
        }
    })
}

fn saw() -> Wave {
    core::array::from_fn(|i| {
        if i < HALF {
            i as f64 / HALF as f64
        } else {
            i as f64 / HALF as f64 - 2.0
        }
    })
}
