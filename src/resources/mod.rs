//! Resources definitions.
//!
//! Constant parameter tables are plain `const` arrays. Tables that need math
//! functions to be built are computed once on first use and shared through
//! [`tables()`].

pub mod levels;
pub mod modulation;
pub mod waveforms;

use alloc::boxed::Box;

use spin::Once;

/// Number of samples in one waveform cycle.
pub const WAVEFORM_LEN: usize = 1024;

/// Number of selectable waveforms.
pub const WAVEFORM_COUNT: usize = 32;

/// Right shift that turns a 64-bit phase into a waveform index.
pub const WAVEFORM_INDEX_SHIFT: u32 = 54;

/// Number of entries in one cycle of the vibrato and tremolo tables.
pub const MOD_TABLE_LEN: usize = 8192;

/// Right shift that turns the 64-bit LFO phase into a modulation table index.
pub const MOD_TABLE_INDEX_SHIFT: u32 = 51;

/// Scale from native-rate frequency in Hz to FNUM units.
pub const FNUM_COEF: f64 = 524288.0 / 48000.0 * 0.5;

/// Scale applied to modulator outputs before they are used as phase offsets.
pub const MODULATOR_MULTIPLIER: f64 = 4.0;

/// LFO speeds in Hz, selected by the LFO register.
pub const LFO_FREQUENCY_HZ: [f64; 4] = [1.8, 4.0, 5.9, 7.0];

/// Feedback coefficients, selected by the FB register.
pub const FEEDBACK: [f64; 8] = [
    0.0,
    1.0 / 32.0,
    1.0 / 16.0,
    1.0 / 8.0,
    1.0 / 4.0,
    1.0 / 2.0,
    1.0,
    2.0,
];

/// Frequency multipliers times two, selected by the MULT register.
pub const MULTIPLIER_X2: [u64; 16] = [1, 2, 4, 6, 8, 10, 12, 14, 16, 18, 20, 20, 24, 24, 30, 30];

/// Detune offsets in Hz by DT register and key scale number.
pub const DETUNE: [[f64; 16]; 8] = [
    [0.0; 16],
    [
        0.0, 0.0, 0.05, 0.05, 0.05, 0.05, 0.09, 0.09, 0.14, 0.14, 0.18, 0.23, 0.27, 0.32, 0.37,
        0.37,
    ],
    [
        0.05, 0.05, 0.09, 0.09, 0.14, 0.14, 0.18, 0.23, 0.27, 0.32, 0.41, 0.46, 0.59, 0.64, 0.73,
        0.73,
    ],
    [
        0.09, 0.09, 0.14, 0.14, 0.18, 0.23, 0.28, 0.32, 0.41, 0.46, 0.59, 0.64, 0.87, 0.91, 1.00,
        1.00,
    ],
    [0.0; 16],
    [
        -0.0, -0.0, -0.05, -0.05, -0.05, -0.05, -0.09, -0.09, -0.14, -0.14, -0.18, -0.23, -0.27,
        -0.32, -0.37, -0.37,
    ],
    [
        -0.05, -0.05, -0.09, -0.09, -0.14, -0.14, -0.18, -0.23, -0.27, -0.32, -0.41, -0.46, -0.59,
        -0.64, -0.73, -0.73,
    ],
    [
        -0.09, -0.09, -0.14, -0.14, -0.18, -0.23, -0.28, -0.32, -0.41, -0.46, -0.59, -0.64, -0.87,
        -0.91, -1.00, -1.00,
    ],
];

/// Attack rate offsets by KSR and key scale number.
pub const RATE_OFFSET: [[u8; 16]; 2] = [
    [0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3],
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
];

/// Decay slopes in dB per second at rate 4, by KSR and key scale number.
pub const DECAY_DB_PER_SEC_AT_4: [[f64; 16]; 2] = [
    [
        17.9342, 17.9342, 17.9342, 17.9342, 17.9342, 22.4116, 22.4116, 22.4116, 22.4116, 26.9076,
        26.9076, 26.9076, 26.9076, 31.3661, 31.3661, 31.3661,
    ],
    [
        17.9465, 22.4376, 22.4376, 31.4026, 31.4026, 44.8696, 44.8696, 62.7959, 62.7959, 89.6707,
        89.6707, 125.5546, 125.5546, 179.2684, 179.2684, 250.9128,
    ],
];

/// Computed lookup tables.
#[derive(Debug)]
pub struct Tables {
    /// Linear gain for the upper 5 bits of a 7-bit level.
    pub volume: [f64; 32],

    /// Equal-power left/right gains by pan position.
    pub pan: [[f64; 2]; 128],

    /// Key scale level attenuation by KSL, block and `fnum >> 5`.
    pub ksl: [[[f64; 32]; 8]; 4],

    /// 32.32 fixed point frequency ratios by vibrato depth.
    pub vibrato: Box<[[u64; MOD_TABLE_LEN]]>,

    /// Linear gains by tremolo depth.
    pub tremolo: Box<[[f64; MOD_TABLE_LEN]]>,

    /// Single cycle waveforms by WS register.
    pub waveforms: Box<[[f64; WAVEFORM_LEN]]>,
}

static TABLES: Once<Tables> = Once::new();

/// Returns the shared lookup tables, building them on first use.
pub fn tables() -> &'static Tables {
    TABLES.call_once(|| Tables {
        volume: levels::volume_table(),
        pan: levels::pan_table(),
        ksl: levels::ksl_table(),
        vibrato: modulation::vibrato_table(),
        tremolo: modulation::tremolo_table(),
        waveforms: waveforms::waveform_table(),
    })
}
