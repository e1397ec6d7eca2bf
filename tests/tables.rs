//! Tests for the computed lookup tables.

use ma5_fm_dsp::resources::modulation::{triangle_cosine, triangle_sine};
use ma5_fm_dsp::resources::{tables, FEEDBACK, MOD_TABLE_LEN, WAVEFORM_COUNT, WAVEFORM_LEN};
use ma5_fm_dsp::SampleRate;

#[test]
fn tables_are_built_once() {
    assert!(core::ptr::eq(tables(), tables()));
}

#[test]
fn volume_is_monotonic() {
    let volume = &tables().volume;

    assert_eq!(volume[0], 0.0);
    assert_eq!(volume[31], 1.0);
    for i in 1..31 {
        assert!(volume[i] < volume[i + 1], "step {i}");
    }
}

#[test]
fn pan_is_equal_power() {
    let pan = &tables().pan;

    for [l, r] in pan.iter() {
        assert!((l * l + r * r - 1.0).abs() < 1e-12);
    }
    assert!((pan[0][0] - 1.0).abs() < 1e-12);
    assert!((pan[127][1] - 1.0).abs() < 1e-12);
}

#[test]
fn ksl_only_attenuates() {
    let ksl = &tables().ksl;

    assert!(ksl[0].iter().flatten().all(|&gain| gain == 1.0));
    for table in ksl.iter() {
        assert!(table.iter().flatten().all(|&gain| gain > 0.0 && gain <= 1.0));
        assert!(table[0].iter().chain(table[1].iter()).all(|&gain| gain == 1.0));
    }
    assert!(ksl[3][7][15] < ksl[1][7][15]);
}

#[test]
fn waveforms_are_bounded() {
    let waveforms = &tables().waveforms;
    assert_eq!(waveforms.len(), WAVEFORM_COUNT);

    for (ws, wave) in waveforms.iter().enumerate() {
        assert!(wave.iter().all(|s| (-1.0..=1.0).contains(s)), "ws {ws}");
    }

    for ws in [15, 23, 31] {
        assert!(waveforms[ws].iter().all(|&s| s == 0.0), "ws {ws}");
    }
}

#[test]
fn waveform_variants() {
    let waveforms = &tables().waveforms;
    let half = WAVEFORM_LEN / 2;
    let quarter = WAVEFORM_LEN / 4;

    assert!((waveforms[0][quarter] - 1.0).abs() < 1e-12);
    assert!((waveforms[0][3 * quarter] + 1.0).abs() < 1e-12);

    // Half sine is silent in the second half.
    assert!(waveforms[1][half..].iter().all(|&s| s == 0.0));
    // Abs sine repeats the positive lobe.
    assert!(waveforms[2].iter().all(|&s| s >= 0.0));
    assert_eq!(waveforms[2][half + 10], waveforms[0][10]);
    // Double speed packs one cycle into the first half.
    assert_eq!(waveforms[4][quarter / 2], waveforms[0][quarter]);

    assert!(waveforms[6][..half].iter().all(|&s| s == 1.0));
    assert!(waveforms[6][half..].iter().all(|&s| s == -1.0));

    assert_eq!(waveforms[7][0], 1.0);
    assert!(waveforms[7][WAVEFORM_LEN - 1] < 0.0);

    assert_eq!(waveforms[16][quarter], 1.0);
    assert_eq!(waveforms[16][3 * quarter], -1.0);
    assert_eq!(waveforms[24][0], 0.0);
    assert!(waveforms[24][half - 1] > 0.99);
    assert_eq!(waveforms[24][half], -1.0);
}

#[test]
fn modulation_tables_center_on_unity() {
    let t = tables();

    for depth in 0..4 {
        assert_eq!(t.vibrato[depth][0], 1u64 << 32);
        assert!(t.vibrato[depth][MOD_TABLE_LEN / 4] > 1u64 << 32);
        assert!(t.vibrato[depth][3 * MOD_TABLE_LEN / 4] < 1u64 << 32);

        assert_eq!(t.tremolo[depth][0], 1.0);
        assert!(t.tremolo[depth].iter().all(|&gain| gain > 0.0 && gain <= 1.0));
    }

    assert!(t.tremolo[3][MOD_TABLE_LEN / 2] < t.tremolo[0][MOD_TABLE_LEN / 2]);
}

#[test]
fn lfo_shapes() {
    assert_eq!(triangle_sine(0.0), 0.0);
    assert_eq!(triangle_sine(0.25), 1.0);
    assert_eq!(triangle_sine(0.75), -1.0);
    assert_eq!(triangle_cosine(0.0), 1.0);
    assert_eq!(triangle_cosine(0.5), -1.0);
}

#[test]
fn feedback_levels_are_powers_of_two() {
    assert_eq!(FEEDBACK[0], 0.0);
    for fb in 1..8 {
        assert_eq!(FEEDBACK[fb], FEEDBACK[fb - 1].max(1.0 / 64.0) * 2.0);
    }
}

#[test]
fn feedback_weight_follows_sample_rate() {
    assert_eq!(SampleRate::new(48000.0).feedback_weight, 0.5);
    assert_eq!(SampleRate::new(96000.0).feedback_weight, 0.0);
    assert_eq!(SampleRate::new(24000.0).feedback_weight, 1.0);
    assert!((SampleRate::new(44100.0).feedback_weight - 0.621875).abs() < 1e-12);
}
