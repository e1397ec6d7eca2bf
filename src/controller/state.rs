//! Controller-side state of MIDI channels and chip channels.

use crate::voice::VoiceProgram;

use super::frequency::PITCH_CENTER;

/// RPN selector value meaning "no parameter selected".
pub const RPN_NULL: u16 = 0x3FFF;

/// Status flags of a chip channel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    pub const SUSTAINED: Flags = Flags(0x02);
    pub const VIBRATO: Flags = Flags(0x04);
    pub const RELEASED: Flags = Flags(0x40);
    pub const FREE: Flags = Flags(0x80);

    pub const fn empty() -> Self {
        Flags(0)
    }

    #[inline]
    pub fn contains(self, other: Flags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Flags) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Flags) {
        self.0 &= !other.0;
    }

    #[inline]
    pub fn set(&mut self, other: Flags, value: bool) {
        if value {
            self.insert(other);
        } else {
            self.remove(other);
        }
    }
}

impl core::ops::BitOr for Flags {
    type Output = Flags;

    fn bitor(self, rhs: Flags) -> Flags {
        Flags(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MidiChannelState<'a> {
    pub bank_msb: u8,
    pub bank_lsb: u8,
    pub program: u8,
    pub volume: u8,
    pub expression: u8,
    pub pan: u8,
    /// Pitch bend in 1/32 semitones, centre 64.
    pub pitch: i32,
    pub sustain: u8,
    pub modulation: u8,
    pub rpn: u16,
    /// Pitch bend range as semitones * 100 + cents.
    pub pitch_sensitivity: u16,
    pub mono: bool,
    /// Program used by the most recent note on this channel.
    pub last_program: Option<&'a VoiceProgram>,
}

impl Default for MidiChannelState<'_> {
    fn default() -> Self {
        Self {
            bank_msb: 0,
            bank_lsb: 0,
            program: 0,
            volume: 100,
            expression: 127,
            pan: 64,
            pitch: PITCH_CENTER,
            sustain: 0,
            modulation: 0,
            rpn: RPN_NULL,
            pitch_sensitivity: 200,
            mono: false,
            last_program: None,
        }
    }
}

impl MidiChannelState<'_> {
    #[inline]
    pub fn is_sustain_on(&self) -> bool {
        self.sustain >= 0x40
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipChannelState<'a> {
    /// Bound MIDI channel, `None` while the channel is free.
    pub midi_channel: Option<u8>,
    pub note: u8,
    /// Note actually played, after drum remapping.
    pub real_note: u8,
    pub finetune: i32,
    pub pitch: i32,
    pub program: Option<&'a VoiceProgram>,
    /// Controller time of the last note-on or key-off.
    pub time: u64,
    pub flags: Flags,
    /// Slowest release rate among the carriers of the bound voice.
    pub min_rr: u8,
}

impl Default for ChipChannelState<'_> {
    fn default() -> Self {
        Self {
            midi_channel: None,
            note: 0,
            real_note: 0,
            finetune: 0,
            pitch: PITCH_CENTER,
            program: None,
            time: 0,
            flags: Flags::RELEASED | Flags::FREE,
            min_rr: 15,
        }
    }
}

impl ChipChannelState<'_> {
    #[inline]
    pub fn is_free(&self) -> bool {
        self.flags.contains(Flags::FREE)
    }

    #[inline]
    pub fn is_bound_to(&self, midi_channel: u8) -> bool {
        self.midi_channel == Some(midi_channel)
    }

    /// Estimated attenuation since the last touch. Attenuation in dB grows
    /// with elapsed time and doubles with each release rate step.
    #[inline]
    pub fn decay_score(&self, now: u64) -> u128 {
        (now.saturating_sub(self.time) as u128) << self.min_rr.min(15)
    }
}
