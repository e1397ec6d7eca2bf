//! MIDI controller.
//!
//! Translates MIDI channel messages into chip register writes. Each note-on
//! is bound to one of the chip channels; when all are busy, the channel that
//! has most likely faded out is stolen.

pub mod frequency;
pub mod midi;
pub mod state;

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use crate::chip::registers::{ChRegister, OpRegister, Registers};
use crate::fm::algorithms::Algorithm;
use crate::voice::{default_program, FmVoice, Voice, VoiceLibrary, VoiceProgram};
use crate::{CHANNEL_COUNT, MIDI_CHANNEL_COUNT, OPERATOR_COUNT};

use frequency::{fnum_block, PITCH_CENTER};
use midi::{MidiMessage, MidiQueue, MidiSender, TimedMessage, DEFAULT_QUEUE_CAPACITY};
use state::{ChipChannelState, Flags, MidiChannelState, RPN_NULL};

/// Modulation wheel value from which vibrato is switched on.
pub const MODULATION_THRESHOLD: u8 = 40;

const CC_BANK_MSB: u8 = 0;
const CC_MODULATION: u8 = 1;
const CC_DATA_ENTRY_MSB: u8 = 6;
const CC_VOLUME: u8 = 7;
const CC_PAN: u8 = 10;
const CC_EXPRESSION: u8 = 11;
const CC_BANK_LSB: u8 = 32;
const CC_DATA_ENTRY_LSB: u8 = 38;
const CC_SUSTAIN: u8 = 64;
const CC_NRPN_LSB: u8 = 98;
const CC_NRPN_MSB: u8 = 99;
const CC_RPN_LSB: u8 = 100;
const CC_RPN_MSB: u8 = 101;
const CC_ALL_SOUNDS_OFF: u8 = 120;
const CC_ALL_NOTES_OFF: u8 = 123;
const CC_MONO: u8 = 126;
const CC_POLY: u8 = 127;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// Play every non-drum program in mono mode.
    pub force_mono: bool,
    /// Bit `n` set ignores MIDI channel `n`.
    pub ignored_midi_channels: u16,
    /// Only this MIDI channel is audible when set.
    pub solo_midi_channel: Option<u8>,
    /// Capacity of the incoming message queue.
    pub queue_capacity: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            force_mono: false,
            ignored_midi_channels: 0,
            solo_midi_channel: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Reasons a note-on could not be given a chip channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationError {
    UnsupportedVoice(&'static str),
    NoFreeChannel,
}

impl fmt::Display for AllocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationError::UnsupportedVoice(kind) => write!(f, "unsupported voice type {kind}"),
            AllocationError::NoFreeChannel => write!(f, "no free chip channel"),
        }
    }
}

/// Snapshot of one MIDI channel for status displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelStatus<'a> {
    pub bank_msb: u8,
    pub bank_lsb: u8,
    pub program: u8,
    pub instrument: Option<&'a VoiceProgram>,
    pub mono: bool,
    pub volume: u8,
    pub expression: u8,
    pub pan: u8,
    pub voices: usize,
    pub last_note: Option<u8>,
}

pub struct Controller<'a, R: Registers> {
    registers: R,
    library: &'a VoiceLibrary,
    options: ControllerOptions,

    queue: MidiSender,
    due: Vec<TimedMessage>,
    now: u64,

    midi_channels: [MidiChannelState<'a>; MIDI_CHANNEL_COUNT],
    chip_channels: [ChipChannelState<'a>; CHANNEL_COUNT],
}

impl<'a, R: Registers> Controller<'a, R> {
    pub fn new(registers: R, library: &'a VoiceLibrary, options: ControllerOptions) -> Self {
        let queue = Arc::new(MidiQueue::new(options.queue_capacity));
        let due = Vec::with_capacity(queue.capacity());

        let mut controller = Self {
            registers,
            library,
            options,
            queue,
            due,
            now: 0,
            midi_channels: core::array::from_fn(|_| MidiChannelState::default()),
            chip_channels: core::array::from_fn(|_| ChipChannelState::default()),
        };

        controller.reset();
        controller
    }

    #[inline]
    pub fn registers(&self) -> &R {
        &self.registers
    }

    #[inline]
    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.registers
    }

    #[inline]
    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    /// Current controller time.
    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn midi_channel_state(&self, midi_channel: usize) -> &MidiChannelState<'a> {
        &self.midi_channels[midi_channel]
    }

    pub fn chip_channel_state(&self, chip_channel: usize) -> &ChipChannelState<'a> {
        &self.chip_channels[chip_channel]
    }

    /// Returns a handle other threads can push messages with.
    pub fn midi_sender(&self) -> MidiSender {
        self.queue.clone()
    }

    /// Moves the controller clock forward to `now`. Callers that use the
    /// note and controller methods directly stamp their events with this.
    /// The clock never runs backwards.
    pub fn advance_to(&mut self, now: u64) {
        self.now = self.now.max(now);
    }

    /// Applies a message at `timestamp` without going through the queue.
    pub fn apply_at(&mut self, timestamp: u64, message: MidiMessage) {
        self.advance_to(timestamp);
        self.apply(message);
    }

    /// Queues a message to be applied once `timestamp` is flushed.
    pub fn push_midi_message(&self, timestamp: u64, message: MidiMessage) {
        self.queue.push(timestamp, message);
    }

    /// Applies every queued message with a timestamp up to `until`, in
    /// arrival order.
    pub fn flush_midi_messages(&mut self, until: u64) {
        let mut due = core::mem::take(&mut self.due);
        self.queue.take_due(until, &mut due);

        for timed in due.drain(..) {
            self.apply_at(timed.timestamp, timed.message);
        }

        self.due = due;
        self.advance_to(until);
    }

    /// Applies a message immediately at the current controller time.
    pub fn apply(&mut self, message: MidiMessage) {
        match message {
            MidiMessage::NoteOn {
                channel,
                note,
                velocity,
            } => self.note_on(channel, note, velocity),
            MidiMessage::NoteOff { channel, note } => self.note_off(channel, note),
            MidiMessage::ControlChange {
                channel,
                control,
                value,
            } => self.control_change(channel, control, value),
            MidiMessage::ProgramChange { channel, program } => {
                self.program_change(channel, program)
            }
            MidiMessage::PitchBend { channel, value } => self.pitch_bend(channel, value),
        }
    }

    /// Silences and frees every chip channel and restores MIDI channel
    /// defaults.
    pub fn reset(&mut self) {
        for chip_channel in 0..CHANNEL_COUNT {
            self.reset_chip_channel(chip_channel);
        }

        for state in self.midi_channels.iter_mut() {
            *state = MidiChannelState::default();
        }
    }

    pub fn note_on(&mut self, midi_channel: u8, note: u8, velocity: u8) {
        if velocity == 0 {
            self.note_off(midi_channel, note);
            return;
        }

        if self.is_ignored(midi_channel) {
            return;
        }

        let program = self.find_program(midi_channel, note);

        match self.allocate(midi_channel, note, program) {
            Ok(chip_channel) => {
                log::debug!(
                    "Note on: ch={} note={} vel={} -> chip ch{}",
                    midi_channel,
                    note,
                    velocity,
                    chip_channel
                );
                self.occupy(chip_channel, midi_channel, note, velocity, program);
            }
            Err(err) => {
                log::warn!(
                    "Note on dropped: ch={} note={} {}: {}",
                    midi_channel,
                    note,
                    program,
                    err
                );
            }
        }
    }

    pub fn note_off(&mut self, midi_channel: u8, note: u8) {
        if self.is_ignored(midi_channel) {
            return;
        }

        let sustain = self.midi_channels[midi_channel as usize].is_sustain_on();

        for chip_channel in 0..CHANNEL_COUNT {
            let state = &mut self.chip_channels[chip_channel];
            if !state.is_bound_to(midi_channel) || state.note != note {
                continue;
            }

            if sustain {
                state.flags.insert(Flags::SUSTAINED);
            } else {
                log::debug!("Note off: ch={} note={} chip ch{}", midi_channel, note, chip_channel);
                self.key_off(chip_channel);
            }
        }
    }

    pub fn control_change(&mut self, midi_channel: u8, control: u8, value: u8) {
        if self.is_ignored(midi_channel) {
            return;
        }

        let index = midi_channel as usize;

        match control {
            CC_BANK_MSB => self.midi_channels[index].bank_msb = value,
            CC_BANK_LSB => self.midi_channels[index].bank_lsb = value,
            CC_MODULATION => {
                self.midi_channels[index].modulation = value;
                let vibrato = value >= MODULATION_THRESHOLD;

                for chip_channel in 0..CHANNEL_COUNT {
                    let state = &mut self.chip_channels[chip_channel];
                    if !state.is_bound_to(midi_channel) {
                        continue;
                    }

                    let before = state.flags;
                    state.flags.set(Flags::VIBRATO, vibrato);

                    if state.flags != before {
                        if let Some(Voice::Fm(voice)) = state.program.map(|p| &p.voice) {
                            write_modulation(&mut self.registers, chip_channel, voice, vibrato);
                        }
                    }
                }
            }
            CC_VOLUME => {
                self.midi_channels[index].volume = value;
                if self.is_audible(midi_channel) {
                    self.write_bound_channels(midi_channel, ChRegister::Volume, value as u16);
                }
            }
            CC_EXPRESSION => {
                self.midi_channels[index].expression = value;
                self.write_bound_channels(midi_channel, ChRegister::Expression, value as u16);
            }
            CC_PAN => {
                self.midi_channels[index].pan = value;
                self.write_bound_channels(midi_channel, ChRegister::Chpan, value as u16);
            }
            CC_SUSTAIN => {
                self.midi_channels[index].sustain = value;
                if value < 0x40 {
                    self.release_sustained(midi_channel);
                }
            }
            CC_MONO => self.midi_channels[index].mono = true,
            CC_POLY => self.midi_channels[index].mono = false,
            CC_ALL_NOTES_OFF => {
                let sustain = self.midi_channels[index].is_sustain_on();
                for chip_channel in 0..CHANNEL_COUNT {
                    if !self.chip_channels[chip_channel].is_bound_to(midi_channel) {
                        continue;
                    }
                    if sustain {
                        self.chip_channels[chip_channel]
                            .flags
                            .insert(Flags::SUSTAINED);
                    } else {
                        self.key_off(chip_channel);
                    }
                }
            }
            CC_ALL_SOUNDS_OFF => {
                for chip_channel in 0..CHANNEL_COUNT {
                    if self.chip_channels[chip_channel].is_bound_to(midi_channel) {
                        self.key_off(chip_channel);
                    }
                }
            }
            CC_RPN_MSB => {
                let state = &mut self.midi_channels[index];
                state.rpn = (state.rpn & 0x007F) | (value as u16) << 7;
            }
            CC_RPN_LSB => {
                let state = &mut self.midi_channels[index];
                state.rpn = (state.rpn & 0x3F80) | value as u16;
            }
            CC_NRPN_MSB | CC_NRPN_LSB => self.midi_channels[index].rpn = RPN_NULL,
            CC_DATA_ENTRY_MSB => {
                let state = &mut self.midi_channels[index];
                if state.rpn == 0 {
                    state.pitch_sensitivity = value as u16 * 100 + state.pitch_sensitivity % 100;
                }
            }
            CC_DATA_ENTRY_LSB => {
                let state = &mut self.midi_channels[index];
                if state.rpn == 0 {
                    state.pitch_sensitivity = value as u16 + state.pitch_sensitivity / 100 * 100;
                }
            }
            _ => {}
        }
    }

    /// Selects the program for following notes. Sounding notes keep theirs.
    pub fn program_change(&mut self, midi_channel: u8, program: u8) {
        if self.is_ignored(midi_channel) {
            return;
        }

        self.midi_channels[midi_channel as usize].program = program;
    }

    /// Applies a 14-bit pitch bend, centre 8192.
    pub fn pitch_bend(&mut self, midi_channel: u8, value: u16) {
        if self.is_ignored(midi_channel) {
            return;
        }

        let state = &mut self.midi_channels[midi_channel as usize];
        let bend = value.min(0x3FFF) as i32 - 8192;
        state.pitch = bend * state.pitch_sensitivity as i32 / (200 * 128) + PITCH_CENTER;
        let pitch = state.pitch;

        for chip_channel in 0..CHANNEL_COUNT {
            let state = &mut self.chip_channels[chip_channel];
            if !state.is_bound_to(midi_channel) {
                continue;
            }

            state.pitch = state.finetune + pitch;
            let (note, pitch) = (state.real_note, state.pitch);
            self.write_frequency(chip_channel, note, pitch);
        }
    }

    /// Per-MIDI-channel summary of the current state.
    pub fn status(&self) -> [ChannelStatus<'a>; MIDI_CHANNEL_COUNT] {
        core::array::from_fn(|i| {
            let midi = &self.midi_channels[i];
            let bound = self
                .chip_channels
                .iter()
                .filter(|state| state.is_bound_to(i as u8));
            let voices = bound.clone().count();
            let latest = bound.max_by_key(|state| state.time);

            ChannelStatus {
                bank_msb: midi.bank_msb,
                bank_lsb: midi.bank_lsb,
                program: midi.program,
                instrument: midi.last_program,
                mono: midi.mono,
                volume: midi.volume,
                expression: midi.expression,
                pan: midi.pan,
                voices,
                last_note: latest.map(|state| state.note),
            }
        })
    }

    /// Writes the status table to the log.
    pub fn log_status(&self) {
        log::info!("Ch MSB-LSB-@PC Instrument       P Vol Exp Pan Vo Note");

        for (i, status) in self.status().iter().enumerate() {
            let (program, name, mode) = match status.instrument {
                Some(instrument) => (
                    format!(
                        "{:03}-{:03}-{:03}",
                        status.bank_msb, status.bank_lsb, status.program
                    ),
                    instrument.name.as_str(),
                    if status.mono { "M" } else { "P" },
                ),
                None => (String::from("-----------"), "", "-"),
            };
            let note = status
                .last_note
                .map(|note| format!("{}{}", NOTE_NAMES[note as usize % 12], note as i32 / 12 - 2))
                .unwrap_or_default();

            log::info!(
                "{:2} {} {:<16} {} {:3} {:3} {:3} {:2} {:<4}",
                i + 1,
                program,
                name,
                mode,
                status.volume,
                status.expression,
                status.pan,
                status.voices,
                note
            );
        }
    }

    #[inline]
    fn is_ignored(&self, midi_channel: u8) -> bool {
        if midi_channel as usize >= MIDI_CHANNEL_COUNT {
            log::warn!("MIDI channel out of range: {midi_channel}");
            return true;
        }

        self.options.ignored_midi_channels & (1 << midi_channel) != 0
    }

    #[inline]
    fn is_audible(&self, midi_channel: u8) -> bool {
        self.options
            .solo_midi_channel
            .map_or(true, |solo| solo == midi_channel)
    }

    fn find_program(&self, midi_channel: u8, note: u8) -> &'a VoiceProgram {
        let state = &self.midi_channels[midi_channel as usize];

        match self
            .library
            .find(state.bank_msb, state.bank_lsb, state.program, note)
        {
            Some(program) => program,
            None => {
                log::warn!(
                    "Voice not found: @{}-{}-{} note={}, using default",
                    state.bank_msb,
                    state.bank_lsb,
                    state.program,
                    note
                );
                default_program()
            }
        }
    }

    /// Picks the chip channel for a note, stealing one if needed.
    fn allocate(
        &mut self,
        midi_channel: u8,
        note: u8,
        program: &VoiceProgram,
    ) -> Result<usize, AllocationError> {
        if !matches!(program.voice, Voice::Fm(_)) {
            return Err(AllocationError::UnsupportedVoice(program.voice.kind()));
        }

        let mono = self.midi_channels[midi_channel as usize].mono
            || (self.options.force_mono && !program.is_drum());

        let found = if mono {
            self.find_last_used_channel(midi_channel, note)
        } else {
            None
        };

        found
            .or_else(|| self.find_free_channel())
            .ok_or(AllocationError::NoFreeChannel)
    }

    /// Mono mode: a channel already playing this MIDI channel, preferring the
    /// same note, then the one that has faded least.
    fn find_last_used_channel(&self, midi_channel: u8, note: u8) -> Option<usize> {
        let mut found = None;
        let mut min_score = u128::MAX;

        for (i, state) in self.chip_channels.iter().enumerate() {
            if !state.is_bound_to(midi_channel) {
                continue;
            }
            if state.note == note {
                return Some(i);
            }

            let score = state.decay_score(self.now);
            if score < min_score {
                min_score = score;
                found = Some(i);
            }
        }

        found
    }

    /// Poly mode: a free channel, else the released channel that has most
    /// likely faded out, else the oldest channel. Stolen channels are reset.
    fn find_free_channel(&mut self) -> Option<usize> {
        if let Some(i) = self.chip_channels.iter().position(|state| state.is_free()) {
            return Some(i);
        }

        let mut oldest = None;
        let mut max_elapsed = None;
        let mut faded = None;
        let mut max_score = None;

        for (i, state) in self.chip_channels.iter().enumerate() {
            let elapsed = self.now.saturating_sub(state.time);
            if max_elapsed.map_or(true, |max| elapsed > max) {
                max_elapsed = Some(elapsed);
                oldest = Some(i);
            }

            let score = state.decay_score(self.now);
            if state.flags.contains(Flags::RELEASED) && max_score.map_or(true, |max| score > max) {
                max_score = Some(score);
                faded = Some(i);
            }
        }

        let victim = faded.or(oldest)?;
        log::debug!("Stealing chip ch{}", victim);
        self.reset_chip_channel(victim);

        Some(victim)
    }

    fn occupy(
        &mut self,
        chip_channel: usize,
        midi_channel: u8,
        note: u8,
        velocity: u8,
        program: &'a VoiceProgram,
    ) {
        let Voice::Fm(voice) = &program.voice else {
            return;
        };

        let midi = &mut self.midi_channels[midi_channel as usize];
        midi.last_program = Some(program);
        let (pan, volume, expression) = (midi.pan, midi.volume, midi.expression);
        let vibrato = midi.modulation >= MODULATION_THRESHOLD;
        let pitch = midi.pitch;

        let algorithm = Algorithm::from(voice.alg);
        let min_rr = voice
            .operators
            .iter()
            .take(OPERATOR_COUNT)
            .enumerate()
            .filter(|(i, _)| algorithm.is_carrier(*i))
            .map(|(_, op)| op.rr)
            .fold(15, u8::min);

        let real_note = if program.is_drum() {
            voice.drum_key
        } else {
            note
        };

        let state = &mut self.chip_channels[chip_channel];
        state.midi_channel = Some(midi_channel);
        state.note = note;
        state.real_note = real_note;
        state.flags = Flags::empty();
        state.flags.set(Flags::VIBRATO, vibrato);
        state.time = self.now;
        state.finetune = 0;
        state.pitch = state.finetune + pitch;
        state.program = Some(program);
        state.min_rr = min_rr;
        let pitch = state.pitch;

        let volume = if self.is_audible(midi_channel) {
            volume
        } else {
            0
        };

        write_voice(&mut self.registers, chip_channel, voice);
        write_modulation(&mut self.registers, chip_channel, voice, vibrato);

        let regs = &mut self.registers;
        regs.write_channel(chip_channel, ChRegister::Chpan, pan as u16);
        regs.write_channel(chip_channel, ChRegister::Volume, volume as u16);
        regs.write_channel(chip_channel, ChRegister::Expression, expression as u16);
        regs.write_channel(chip_channel, ChRegister::Velocity, velocity as u16);
        self.write_frequency(chip_channel, real_note, pitch);
        self.registers
            .write_channel(chip_channel, ChRegister::Kon, 1);
    }

    fn key_off(&mut self, chip_channel: usize) {
        let state = &mut self.chip_channels[chip_channel];
        state.time = self.now;
        state.flags = Flags::RELEASED;

        self.registers
            .write_channel(chip_channel, ChRegister::Kon, 0);
    }

    fn release_sustained(&mut self, midi_channel: u8) {
        for chip_channel in 0..CHANNEL_COUNT {
            let state = &self.chip_channels[chip_channel];
            if state.is_bound_to(midi_channel) && state.flags.contains(Flags::SUSTAINED) {
                self.key_off(chip_channel);
            }
        }
    }

    /// Mutes the chip channel at once and marks it free.
    fn reset_chip_channel(&mut self, chip_channel: usize) {
        self.chip_channels[chip_channel] = ChipChannelState::default();

        let regs = &mut self.registers;
        for op in 0..OPERATOR_COUNT {
            regs.write_operator(chip_channel, op, OpRegister::Sl, 0);
            regs.write_operator(chip_channel, op, OpRegister::Rr, 15);
            regs.write_operator(chip_channel, op, OpRegister::Ksl, 0);
            regs.write_operator(chip_channel, op, OpRegister::Tl, 63);
        }
        regs.write_channel(chip_channel, ChRegister::Kon, 0);
    }

    fn write_bound_channels(&mut self, midi_channel: u8, register: ChRegister, value: u16) {
        for chip_channel in 0..CHANNEL_COUNT {
            if self.chip_channels[chip_channel].is_bound_to(midi_channel) {
                self.registers.write_channel(chip_channel, register, value);
            }
        }
    }

    fn write_frequency(&mut self, chip_channel: usize, note: u8, pitch: i32) {
        let (fnum, block) = fnum_block(note, pitch);
        self.registers
            .write_channel(chip_channel, ChRegister::Fnum, fnum);
        self.registers
            .write_channel(chip_channel, ChRegister::Block, block as u16);
    }
}

fn write_voice<R: Registers>(registers: &mut R, chip_channel: usize, voice: &FmVoice) {
    for op in 0..OPERATOR_COUNT {
        registers.write_operator(chip_channel, op, OpRegister::Tl, 63);
    }

    for (i, op) in voice.operators.iter().take(OPERATOR_COUNT).enumerate() {
        let values = [
            (OpRegister::Eam, op.eam as u16),
            (OpRegister::Evb, op.evb as u16),
            (OpRegister::Dam, op.dam as u16),
            (OpRegister::Dvb, op.dvb as u16),
            (OpRegister::Dt, op.dt as u16),
            (OpRegister::Ksl, op.ksl as u16),
            (OpRegister::Ksr, op.ksr as u16),
            (OpRegister::Ws, op.ws as u16),
            (OpRegister::Mult, op.mult as u16),
            (OpRegister::Fb, op.fb as u16),
            (OpRegister::Ar, op.ar as u16),
            (OpRegister::Dr, op.dr as u16),
            (OpRegister::Sl, op.sl as u16),
            (OpRegister::Sr, op.sr as u16),
            (OpRegister::Rr, op.rr as u16),
            (OpRegister::Tl, op.tl as u16),
            (OpRegister::Xof, op.xof as u16),
        ];

        for (register, value) in values {
            registers.write_operator(chip_channel, i, register, value);
        }
    }

    registers.write_channel(chip_channel, ChRegister::Alg, voice.alg as u16);
    registers.write_channel(chip_channel, ChRegister::Lfo, voice.lfo as u16);
    registers.write_channel(chip_channel, ChRegister::Panpot, voice.panpot as u16);
    registers.write_channel(chip_channel, ChRegister::Bo, voice.bo as u16);
}

/// Vibrato on an operator is the voice's own setting or the modulation wheel.
fn write_modulation<R: Registers>(
    registers: &mut R,
    chip_channel: usize,
    voice: &FmVoice,
    vibrato: bool,
) {
    for (i, op) in voice.operators.iter().take(OPERATOR_COUNT).enumerate() {
        registers.write_operator(chip_channel, i, OpRegister::Evb, (op.evb || vibrato) as u16);
    }
}
