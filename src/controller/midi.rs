//! MIDI channel messages and the queue that carries them to the controller.

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

/// Default number of messages the queue holds before dropping.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Channel voice messages understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage {
    /// Velocity 0 is handled as a note off.
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
    ControlChange { channel: u8, control: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    /// 14-bit bend value, centre 8192.
    PitchBend { channel: u8, value: u16 },
}

impl MidiMessage {
    /// Decodes a raw channel message. Returns `None` for anything else.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let status = *bytes.first()?;
        let channel = status & 0x0F;
        let data = |i: usize| bytes.get(i).map(|b| b & 0x7F);

        let message = match status & 0xF0 {
            0x80 => MidiMessage::NoteOff {
                channel,
                note: data(1)?,
            },
            0x90 => MidiMessage::NoteOn {
                channel,
                note: data(1)?,
                velocity: data(2)?,
            },
            0xB0 => MidiMessage::ControlChange {
                channel,
                control: data(1)?,
                value: data(2)?,
            },
            0xC0 => MidiMessage::ProgramChange {
                channel,
                program: data(1)?,
            },
            0xE0 => MidiMessage::PitchBend {
                channel,
                value: data(1)? as u16 | (data(2)? as u16) << 7,
            },
            _ => return None,
        };

        Some(message)
    }

    pub fn channel(&self) -> u8 {
        match *self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => channel,
        }
    }
}

/// A message stamped with the time it should take effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedMessage {
    pub timestamp: u64,
    pub message: MidiMessage,
}

/// Bounded FIFO between the MIDI input and the controller.
///
/// When full, the oldest message is dropped to make room for the new one.
#[derive(Debug)]
pub struct MidiQueue {
    messages: Mutex<VecDeque<TimedMessage>>,
    capacity: usize,
}

/// Handle for pushing messages from another thread.
pub type MidiSender = Arc<MidiQueue>;

impl MidiQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            messages: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.messages.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.lock().is_empty()
    }

    /// Appends a message. Never allocates.
    pub fn push(&self, timestamp: u64, message: MidiMessage) {
        let mut messages = self.messages.lock();

        if messages.len() >= self.capacity {
            if let Some(dropped) = messages.pop_front() {
                log::warn!("MIDI queue full, dropping {:?}", dropped.message);
            }
        }

        messages.push_back(TimedMessage { timestamp, message });
    }

    /// Moves every message due at `until` into `due`, keeping arrival order.
    /// Later messages stay queued in order.
    pub fn take_due(&self, until: u64, due: &mut Vec<TimedMessage>) {
        let mut messages = self.messages.lock();

        for _ in 0..messages.len() {
            let Some(message) = messages.pop_front() else {
                break;
            };

            if message.timestamp <= until {
                due.push(message);
            } else {
                messages.push_back(message);
            }
        }
    }
}
