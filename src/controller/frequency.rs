//! Conversion of MIDI notes to FNUM/BLOCK register values.
//!
//! Notes map to the octave block used by the YMF825 application notes, so
//! one octave from C spans FNUM 357..674 and A4 lands on block 4, FNUM 601.

#[allow(unused_imports)]
use num_traits::float::Float;

use crate::resources::FNUM_COEF;

/// Pitch value with no bend or fine tune applied.
pub const PITCH_CENTER: i32 = 64;

/// Pitch steps per semitone.
pub const PITCH_STEPS_PER_SEMITONE: f64 = 32.0;

const A4_NOTE: f64 = 69.0;
const A4_FREQUENCY: f64 = 440.0;

/// Target output frequency in Hz at the nominal octave shift (BO = 1).
pub fn note_frequency(note: u8, pitch: i32) -> f64 {
    let semitones =
        note as f64 - A4_NOTE + (pitch - PITCH_CENTER) as f64 / PITCH_STEPS_PER_SEMITONE;
    A4_FREQUENCY * 2f64.powf(semitones / 12.0)
}

/// Returns `(fnum, block)` for a note and pitch.
pub fn fnum_block(note: u8, pitch: i32) -> (u16, u8) {
    let frequency = note_frequency(note, pitch);
    let mut block = (note as i32 / 12 - 1).clamp(0, 7);
    let mut fnum = fnum_for_block(frequency, block);

    while fnum > 1023 && block < 7 {
        block += 1;
        fnum = fnum_for_block(frequency, block);
    }

    (fnum.clamp(0, 1023) as u16, block as u8)
}

/// Frequency in Hz the chip produces for register values at BO = 1.
pub fn register_frequency(fnum: u16, block: u8) -> f64 {
    fnum as f64 * 2f64.powi(block as i32 + 2) / (16.0 * FNUM_COEF)
}

#[inline]
fn fnum_for_block(frequency: f64, block: i32) -> i32 {
    (frequency * 16.0 * FNUM_COEF / 2f64.powi(block + 2)).round() as i32
}
