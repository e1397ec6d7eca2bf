//! Instrument definitions as loaded from a voice bank.
//!
//! Programs are looked up by bank select and program change. A program with
//! a drum note only answers to that note and plays its voice at the voice's
//! drum key.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use spin::Once;

/// Parameters of one FM operator.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FmOperator {
    pub eam: bool,
    pub evb: bool,
    pub dam: u8,
    pub dvb: u8,
    pub dt: u8,
    pub ksl: u8,
    pub ksr: bool,
    pub ws: u8,
    pub mult: u8,
    pub fb: u8,
    pub ar: u8,
    pub dr: u8,
    pub sl: u8,
    pub sr: u8,
    pub rr: u8,
    pub tl: u8,
    pub xof: bool,
}

/// An FM voice with 2 or 4 operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FmVoice {
    pub drum_key: u8,
    pub panpot: u8,
    pub bo: u8,
    pub lfo: u8,
    pub alg: u8,
    pub operators: Vec<FmOperator>,
}

impl Default for FmVoice {
    fn default() -> Self {
        Self {
            drum_key: 0,
            panpot: 15,
            bo: 1,
            lfo: 0,
            alg: 1,
            operators: vec![FmOperator::default(); 2],
        }
    }
}

/// Voice payload of a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Voice {
    Fm(FmVoice),
    /// Sampled voice, not supported by the synthesis engine.
    Pcm,
    /// Audio loop voice, not supported by the synthesis engine.
    Al,
}

impl Voice {
    pub fn kind(&self) -> &'static str {
        match self {
            Voice::Fm(_) => "FM",
            Voice::Pcm => "PCM",
            Voice::Al => "AL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProgram {
    pub name: String,
    pub bank_msb: u8,
    pub bank_lsb: u8,
    pub program: u8,
    /// Note this program answers to, 0 for melodic programs.
    pub drum_note: u8,
    pub voice: Voice,
}

impl VoiceProgram {
    #[inline]
    pub fn is_drum(&self) -> bool {
        self.drum_note != 0
    }
}

impl fmt::Display for VoiceProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{}-{}-{} {}",
            self.bank_msb, self.bank_lsb, self.program, self.name
        )
    }
}

static DEFAULT_PROGRAM: Once<VoiceProgram> = Once::new();

/// Silent 2-operator patch used when no program matches.
pub fn default_program() -> &'static VoiceProgram {
    DEFAULT_PROGRAM.call_once(|| VoiceProgram {
        name: String::from("default"),
        bank_msb: 0,
        bank_lsb: 0,
        program: 0,
        drum_note: 0,
        voice: Voice::Fm(FmVoice::default()),
    })
}

/// Ordered collection of programs.
#[derive(Debug, Default, Clone)]
pub struct VoiceLibrary {
    programs: Vec<VoiceProgram>,
}

impl VoiceLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, program: VoiceProgram) {
        self.programs.push(program);
    }

    pub fn programs(&self) -> &[VoiceProgram] {
        &self.programs
    }

    /// Returns the first program matching the bank, program and note.
    pub fn find(&self, bank_msb: u8, bank_lsb: u8, program: u8, note: u8) -> Option<&VoiceProgram> {
        self.programs.iter().find(|p| {
            p.program == program
                && p.bank_lsb == bank_lsb
                && p.bank_msb == bank_msb
                && (!p.is_drum() || p.drum_note == note)
        })
    }
}

impl FromIterator<VoiceProgram> for VoiceLibrary {
    fn from_iter<I: IntoIterator<Item = VoiceProgram>>(iter: I) -> Self {
        Self {
            programs: iter.into_iter().collect(),
        }
    }
}
