//! A chip channel: four operators, an algorithm, LFO and output mixing.

use super::algorithms::Algorithm;
use super::operator::Operator;
use crate::resources::{
    tables, Tables, LFO_FREQUENCY_HZ, MODULATOR_MULTIPLIER, MOD_TABLE_INDEX_SHIFT,
};
use crate::{SampleRate, OPERATOR_COUNT};

/// Last two raw outputs of a feedback operator, oldest first.
type FeedbackHistory = [f64; 2];

#[derive(Debug, Clone)]
pub struct Channel {
    sample_rate: SampleRate,
    tables: &'static Tables,

    kon: bool,
    fnum: u16,
    block: u8,
    bo: u8,
    algorithm: Algorithm,
    lfo: u8,
    panpot: u8,
    chpan: u8,
    volume: u8,
    expression: u8,
    velocity: u8,

    lfo_phase: u64,
    lfo_increment: u64,

    feedback: [FeedbackHistory; 2],

    gain: f64,
    pan_left: f64,
    pan_right: f64,

    operators: [Operator; OPERATOR_COUNT],
}

impl Channel {
    pub fn new(sample_rate: SampleRate) -> Self {
        let mut channel = Self {
            sample_rate,
            tables: tables(),
            kon: false,
            fnum: 0,
            block: 0,
            bo: 1,
            algorithm: Algorithm::default(),
            lfo: 0,
            panpot: 15,
            chpan: 64,
            volume: 0,
            expression: 0,
            velocity: 0,
            lfo_phase: 0,
            lfo_increment: 0,
            feedback: [[0.0; 2]; 2],
            gain: 0.0,
            pan_left: 0.0,
            pan_right: 0.0,
            operators: core::array::from_fn(|_| Operator::new(sample_rate)),
        };

        channel.set_alg(0);
        channel.set_lfo(0);
        channel.update_frequency();
        channel.update_gain();
        channel.update_pan();

        channel
    }

    #[inline]
    pub fn operator(&self, index: usize) -> &Operator {
        &self.operators[index]
    }

    #[inline]
    pub fn operator_mut(&mut self, index: usize) -> &mut Operator {
        &mut self.operators[index]
    }

    #[inline]
    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    #[inline]
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    #[inline]
    pub fn is_key_on(&self) -> bool {
        self.kon
    }

    #[inline]
    pub fn fnum(&self) -> u16 {
        self.fnum
    }

    #[inline]
    pub fn block(&self) -> u8 {
        self.block
    }

    /// Left and right output gains of the pan law.
    #[inline]
    pub fn pan_gains(&self) -> (f64, f64) {
        (self.pan_left, self.pan_right)
    }

    /// Highest envelope output among the carriers.
    pub fn current_level(&self) -> f64 {
        self.operators
            .iter()
            .enumerate()
            .filter(|(i, _)| self.algorithm.is_carrier(*i))
            .map(|(_, op)| op.envelope().level() * op.envelope().ceiling())
            .fold(0.0, f64::max)
    }

    /// Renders one stereo sample.
    pub fn next(&mut self) -> (f64, f64) {
        let mod_index = (self.lfo_phase >> MOD_TABLE_INDEX_SHIFT) as usize;
        self.lfo_phase = self.lfo_phase.wrapping_add(self.lfo_increment);

        let fb1 = self.feedback_input(0);
        let fb3 = self.feedback_input(1);

        let [op1, op2, op3, op4] = &mut self.operators;
        let out1;
        let mut out3 = 0.0;

        let output = match self.algorithm {
            Algorithm::Alg0 => {
                if op2.is_off() {
                    return (0.0, 0.0);
                }
                out1 = op1.next(mod_index, fb1);
                op2.next(mod_index, out1 * MODULATOR_MULTIPLIER)
            }
            Algorithm::Alg1 => {
                if op1.is_off() && op2.is_off() {
                    return (0.0, 0.0);
                }
                out1 = op1.next(mod_index, fb1);
                out1 + op2.next(mod_index, 0.0)
            }
            Algorithm::Alg2 => {
                if op1.is_off() && op2.is_off() && op3.is_off() && op4.is_off() {
                    return (0.0, 0.0);
                }
                out1 = op1.next(mod_index, fb1);
                let out2 = op2.next(mod_index, 0.0);
                out3 = op3.next(mod_index, fb3);
                out1 + out2 + out3 + op4.next(mod_index, 0.0)
            }
            Algorithm::Alg3 => {
                if op4.is_off() {
                    return (0.0, 0.0);
                }
                out1 = op1.next(mod_index, fb1);
                let out2 = op2.next(mod_index, 0.0);
                out3 = op3.next(mod_index, out2 * MODULATOR_MULTIPLIER);
                op4.next(mod_index, (out1 + out3) * MODULATOR_MULTIPLIER)
            }
            Algorithm::Alg4 => {
                if op4.is_off() {
                    return (0.0, 0.0);
                }
                out1 = op1.next(mod_index, fb1);
                let out2 = op2.next(mod_index, out1 * MODULATOR_MULTIPLIER);
                out3 = op3.next(mod_index, out2 * MODULATOR_MULTIPLIER);
                op4.next(mod_index, out3 * MODULATOR_MULTIPLIER)
            }
            Algorithm::Alg5 => {
                if op2.is_off() && op4.is_off() {
                    return (0.0, 0.0);
                }
                out1 = op1.next(mod_index, fb1);
                let out2 = op2.next(mod_index, out1 * MODULATOR_MULTIPLIER);
                out3 = op3.next(mod_index, fb3);
                out2 + op4.next(mod_index, out3 * MODULATOR_MULTIPLIER)
            }
            Algorithm::Alg6 => {
                if op1.is_off() && op4.is_off() {
                    return (0.0, 0.0);
                }
                out1 = op1.next(mod_index, fb1);
                let out2 = op2.next(mod_index, 0.0);
                out3 = op3.next(mod_index, out2 * MODULATOR_MULTIPLIER);
                out1 + op4.next(mod_index, out3 * MODULATOR_MULTIPLIER)
            }
            Algorithm::Alg7 => {
                if op1.is_off() && op3.is_off() && op4.is_off() {
                    return (0.0, 0.0);
                }
                out1 = op1.next(mod_index, fb1);
                let out2 = op2.next(mod_index, 0.0);
                out3 = op3.next(mod_index, out2 * MODULATOR_MULTIPLIER);
                out1 + out3 + op4.next(mod_index, 0.0)
            }
        };

        push_history(&mut self.feedback[0], out1);
        push_history(&mut self.feedback[1], out3);

        let output = output * self.gain;
        (output * self.pan_left, output * self.pan_right)
    }

    /// Acts on changes of the key-on flag only.
    pub fn set_kon(&mut self, on: bool) {
        if on == self.kon {
            return;
        }
        self.kon = on;

        if on {
            self.key_on();
        } else {
            self.key_off();
        }
    }

    pub fn set_block(&mut self, value: u8) {
        self.block = value & 7;
        self.update_frequency();
    }

    pub fn set_fnum(&mut self, value: u16) {
        self.fnum = value & 1023;
        self.update_frequency();
    }

    pub fn set_bo(&mut self, value: u8) {
        self.bo = value & 3;
        self.update_frequency();
    }

    pub fn set_alg(&mut self, value: u8) {
        self.algorithm = Algorithm::from(value);
        self.feedback = [[0.0; 2]; 2];

        for (i, op) in self.operators.iter_mut().enumerate() {
            op.is_modulator = self.algorithm.is_modulator(i);
        }
    }

    pub fn set_lfo(&mut self, value: u8) {
        self.lfo = value & 3;
        self.lfo_increment = self
            .sample_rate
            .phase_increment(LFO_FREQUENCY_HZ[self.lfo as usize]);
    }

    pub fn set_panpot(&mut self, value: u8) {
        self.panpot = value & 31;
        self.update_pan();
    }

    pub fn set_chpan(&mut self, value: u8) {
        self.chpan = value & 127;
        self.update_pan();
    }

    pub fn set_volume(&mut self, value: u8) {
        self.volume = value & 127;
        self.update_gain();
    }

    pub fn set_expression(&mut self, value: u8) {
        self.expression = value & 127;
        self.update_gain();
    }

    pub fn set_velocity(&mut self, value: u8) {
        self.velocity = value & 127;
        self.update_gain();
    }

    fn key_on(&mut self) {
        for op in self.operators.iter_mut() {
            op.key_on();
        }
        self.feedback = [[0.0; 2]; 2];
    }

    fn key_off(&mut self) {
        for op in self.operators.iter_mut() {
            op.key_off();
        }
    }

    /// Blended feedback input of operator 1 (`slot` 0) or 3 (`slot` 1).
    #[inline]
    fn feedback_input(&self, slot: usize) -> f64 {
        let [older, newer] = self.feedback[slot];
        let weight = self.sample_rate.feedback_weight;
        let blend = older * (1.0 - weight) + newer * weight;
        blend * self.operators[slot * 2].feedback()
    }

    fn update_frequency(&mut self) {
        for op in self.operators.iter_mut() {
            op.set_channel_frequency(self.fnum, self.block, self.bo);
        }
    }

    fn update_gain(&mut self) {
        let volume = &self.tables.volume;
        self.gain = volume[self.volume as usize >> 2]
            * volume[self.expression as usize >> 2]
            * volume[self.velocity as usize >> 2];
    }

    fn update_pan(&mut self) {
        let pan = (self.chpan as i32 + (self.panpot as i32 - 15) * 4).clamp(0, 127);
        [self.pan_left, self.pan_right] = self.tables.pan[pan as usize];
    }
}

#[inline]
fn push_history(history: &mut FeedbackHistory, value: f64) {
    history[0] = history[1];
    history[1] = value;
}
