//! Register interface of the chip.
//!
//! The controller only talks to the chip through [`Registers`], so it can
//! drive the emulated [`Chip`], a chip shared behind a lock, or the
//! [`RegisterLog`] used in tests.

use alloc::sync::Arc;
use alloc::vec::Vec;

use spin::Mutex;

use super::Chip;
use crate::{CHANNEL_COUNT, OPERATOR_COUNT};

/// Per-operator registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpRegister {
    /// Tremolo enable
    Eam,
    /// Vibrato enable
    Evb,
    /// Tremolo depth
    Dam,
    /// Vibrato depth
    Dvb,
    /// Detune
    Dt,
    /// Key scale level
    Ksl,
    /// Key scale rate
    Ksr,
    /// Waveform select
    Ws,
    /// Frequency multiplier
    Mult,
    /// Feedback level
    Fb,
    /// Attack rate
    Ar,
    /// Decay rate
    Dr,
    /// Sustain level
    Sl,
    /// Sustain rate
    Sr,
    /// Release rate
    Rr,
    /// Total level
    Tl,
    /// Ignore key-off
    Xof,
}

pub const OP_REGISTER_COUNT: usize = 17;

/// Per-channel registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChRegister {
    Kon,
    Block,
    Fnum,
    Alg,
    Lfo,
    Panpot,
    Chpan,
    Volume,
    Expression,
    Velocity,
    Bo,
}

pub const CH_REGISTER_COUNT: usize = 11;

pub trait Registers {
    fn write_operator(&mut self, channel: usize, operator: usize, register: OpRegister, value: u16);

    fn write_channel(&mut self, channel: usize, register: ChRegister, value: u16);
}

impl Registers for Chip {
    fn write_operator(&mut self, channel: usize, operator: usize, register: OpRegister, value: u16) {
        let Some(channel) = self.channel_mut(channel) else {
            return;
        };
        if operator >= OPERATOR_COUNT {
            log::error!("Operator index out of range: {operator}");
            return;
        }

        let op = channel.operator_mut(operator);
        let v = value as u8;

        match register {
            OpRegister::Eam => op.set_eam(value != 0),
            OpRegister::Evb => op.set_evb(value != 0),
            OpRegister::Dam => op.set_dam(v),
            OpRegister::Dvb => op.set_dvb(v),
            OpRegister::Dt => op.set_dt(v),
            OpRegister::Ksl => op.set_ksl(v),
            OpRegister::Ksr => op.set_ksr(value != 0),
            OpRegister::Ws => op.set_ws(v),
            OpRegister::Mult => op.set_mult(v),
            OpRegister::Fb => op.set_fb(v),
            OpRegister::Ar => op.set_ar(v),
            OpRegister::Dr => op.set_dr(v),
            OpRegister::Sl => op.set_sl(v),
            OpRegister::Sr => op.set_sr(v),
            OpRegister::Rr => op.set_rr(v),
            OpRegister::Tl => op.set_tl(v),
            OpRegister::Xof => op.set_xof(value != 0),
        }
    }

    fn write_channel(&mut self, channel: usize, register: ChRegister, value: u16) {
        let Some(channel) = self.channel_mut(channel) else {
            return;
        };
        let v = value as u8;

        match register {
            ChRegister::Kon => channel.set_kon(value != 0),
            ChRegister::Block => channel.set_block(v),
            ChRegister::Fnum => channel.set_fnum(value),
            ChRegister::Alg => channel.set_alg(v),
            ChRegister::Lfo => channel.set_lfo(v),
            ChRegister::Panpot => channel.set_panpot(v),
            ChRegister::Chpan => channel.set_chpan(v),
            ChRegister::Volume => channel.set_volume(v),
            ChRegister::Expression => channel.set_expression(v),
            ChRegister::Velocity => channel.set_velocity(v),
            ChRegister::Bo => channel.set_bo(v),
        }
    }
}

impl<R: Registers + ?Sized> Registers for &mut R {
    #[inline]
    fn write_operator(&mut self, channel: usize, operator: usize, register: OpRegister, value: u16) {
        (**self).write_operator(channel, operator, register, value);
    }

    #[inline]
    fn write_channel(&mut self, channel: usize, register: ChRegister, value: u16) {
        (**self).write_channel(channel, register, value);
    }
}

/// Registers shared with a render callback. The lock is held for one write.
impl<R: Registers> Registers for Arc<Mutex<R>> {
    #[inline]
    fn write_operator(&mut self, channel: usize, operator: usize, register: OpRegister, value: u16) {
        self.lock()
            .write_operator(channel, operator, register, value);
    }

    #[inline]
    fn write_channel(&mut self, channel: usize, register: ChRegister, value: u16) {
        self.lock().write_channel(channel, register, value);
    }
}

/// A single register write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterWrite {
    Operator {
        channel: usize,
        operator: usize,
        register: OpRegister,
        value: u16,
    },
    Channel {
        channel: usize,
        register: ChRegister,
        value: u16,
    },
}

/// Register file that records every write instead of producing sound.
#[derive(Debug, Clone)]
pub struct RegisterLog {
    operators: [[[u16; OP_REGISTER_COUNT]; OPERATOR_COUNT]; CHANNEL_COUNT],
    channels: [[u16; CH_REGISTER_COUNT]; CHANNEL_COUNT],
    writes: Vec<RegisterWrite>,
}

impl Default for RegisterLog {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterLog {
    pub fn new() -> Self {
        let mut operator = [0; OP_REGISTER_COUNT];
        operator[OpRegister::Mult as usize] = 1;
        operator[OpRegister::Ar as usize] = 15;
        operator[OpRegister::Rr as usize] = 15;

        let mut channel = [0; CH_REGISTER_COUNT];
        channel[ChRegister::Panpot as usize] = 15;
        channel[ChRegister::Chpan as usize] = 64;
        channel[ChRegister::Bo as usize] = 1;

        Self {
            operators: [[operator; OPERATOR_COUNT]; CHANNEL_COUNT],
            channels: [channel; CHANNEL_COUNT],
            writes: Vec::new(),
        }
    }

    /// Last value written to an operator register.
    pub fn operator(&self, channel: usize, operator: usize, register: OpRegister) -> u16 {
        self.operators[channel][operator][register as usize]
    }

    /// Last value written to a channel register.
    pub fn channel(&self, channel: usize, register: ChRegister) -> u16 {
        self.channels[channel][register as usize]
    }

    /// All writes in order.
    pub fn writes(&self) -> &[RegisterWrite] {
        &self.writes
    }

    /// Writes addressed to one channel, in order.
    pub fn writes_to(&self, channel: usize) -> impl Iterator<Item = &RegisterWrite> {
        self.writes.iter().filter(move |write| match write {
            RegisterWrite::Operator { channel: c, .. } | RegisterWrite::Channel { channel: c, .. } => {
                *c == channel
            }
        })
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl Registers for RegisterLog {
    fn write_operator(&mut self, channel: usize, operator: usize, register: OpRegister, value: u16) {
        self.operators[channel][operator][register as usize] = value;
        self.writes.push(RegisterWrite::Operator {
            channel,
            operator,
            register,
            value,
        });
    }

    fn write_channel(&mut self, channel: usize, register: ChRegister, value: u16) {
        self.channels[channel][register as usize] = value;
        self.writes.push(RegisterWrite::Channel {
            channel,
            register,
            value,
        });
    }
}
