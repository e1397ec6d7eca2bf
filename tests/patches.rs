//! Voice programs used by the tests

#![allow(dead_code)]

use ma5_fm_dsp::voice::{FmOperator, FmVoice, Voice, VoiceLibrary, VoiceProgram};

/// A 2-operator electric piano: a decaying sine carrier modulated at 1:1.
pub fn electric_piano() -> FmVoice {
    FmVoice {
        drum_key: 0,
        panpot: 15,
        bo: 1,
        lfo: 1,
        alg: 0,
        operators: vec![
            FmOperator {
                mult: 1,
                fb: 3,
                ar: 15,
                dr: 5,
                sl: 4,
                sr: 2,
                rr: 6,
                tl: 20,
                ..Default::default()
            },
            FmOperator {
                mult: 1,
                ar: 15,
                dr: 3,
                sl: 2,
                sr: 1,
                rr: 5,
                tl: 0,
                ..Default::default()
            },
        ],
    }
}

/// A 4-operator pad with a slow attack so the rise can be observed.
pub fn slow_pad() -> FmVoice {
    let carrier = FmOperator {
        mult: 1,
        ar: 4,
        dr: 0,
        sl: 0,
        sr: 0,
        rr: 4,
        tl: 8,
        ..Default::default()
    };

    FmVoice {
        drum_key: 0,
        panpot: 15,
        bo: 1,
        lfo: 2,
        alg: 2,
        operators: vec![carrier.clone(), carrier.clone(), carrier.clone(), carrier],
    }
}

/// A percussive 4-operator stack.
pub fn kick() -> FmVoice {
    FmVoice {
        drum_key: 36,
        panpot: 15,
        bo: 1,
        lfo: 0,
        alg: 4,
        operators: vec![
            FmOperator {
                mult: 2,
                fb: 5,
                ar: 15,
                dr: 10,
                sl: 15,
                rr: 10,
                tl: 30,
                ..Default::default()
            },
            FmOperator {
                mult: 1,
                ar: 15,
                dr: 9,
                sl: 15,
                rr: 10,
                tl: 24,
                ..Default::default()
            },
            FmOperator {
                mult: 1,
                ar: 15,
                dr: 8,
                sl: 15,
                rr: 10,
                tl: 20,
                ..Default::default()
            },
            FmOperator {
                mult: 1,
                ar: 15,
                dr: 6,
                sl: 15,
                rr: 8,
                tl: 0,
                ..Default::default()
            },
        ],
    }
}

pub fn program(name: &str, bank_msb: u8, program: u8, voice: Voice) -> VoiceProgram {
    VoiceProgram {
        name: name.to_string(),
        bank_msb,
        bank_lsb: 0,
        program,
        drum_note: 0,
        voice,
    }
}

/// Melodic programs on bank 0 and a kick drum on bank 125, note 36.
pub fn library() -> VoiceLibrary {
    let mut library: VoiceLibrary = [
        program("E.Piano", 0, 0, Voice::Fm(electric_piano())),
        program("Pad", 0, 1, Voice::Fm(slow_pad())),
        program("Sampled", 0, 2, Voice::Pcm),
    ]
    .into_iter()
    .collect();

    library.push(VoiceProgram {
        name: "Kick".to_string(),
        bank_msb: 125,
        bank_lsb: 0,
        program: 0,
        drum_note: 36,
        voice: Voice::Fm(kick()),
    });

    library
}
