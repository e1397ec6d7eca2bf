//! FM Operator.

use core::fmt;

use super::envelope::{EnvelopeGenerator, Stage};
use super::phase::{key_scale_number, PhaseGenerator};
use crate::resources::{tables, Tables, FEEDBACK, WAVEFORM_INDEX_SHIFT, WAVEFORM_LEN};
use crate::SampleRate;

#[derive(Debug, Clone)]
pub struct Operator {
    tables: &'static Tables,

    /// Whether the current algorithm uses this operator as a modulator.
    pub is_modulator: bool,

    eam: bool,
    evb: bool,
    dam: u8,
    dvb: u8,
    dt: u8,
    ksl: u8,
    ksr: bool,
    ws: u8,
    mult: u8,
    fb: u8,
    ar: u8,
    dr: u8,
    sl: u8,
    sr: u8,
    rr: u8,
    tl: u8,
    xof: bool,

    fnum: u16,
    block: u8,
    bo: u8,

    envelope: EnvelopeGenerator,
    phase: PhaseGenerator,
}

impl Operator {
    pub fn new(sample_rate: SampleRate) -> Self {
        let mut operator = Self {
            tables: tables(),
            is_modulator: false,
            eam: false,
            evb: false,
            dam: 0,
            dvb: 0,
            dt: 0,
            ksl: 0,
            ksr: false,
            ws: 0,
            mult: 1,
            fb: 0,
            ar: 0,
            dr: 0,
            sl: 0,
            sr: 0,
            rr: 0,
            tl: 0,
            xof: false,
            fnum: 0,
            block: 0,
            bo: 1,
            envelope: EnvelopeGenerator::new(sample_rate),
            phase: PhaseGenerator::new(sample_rate),
        };

        operator.update_frequency();
        operator.update_rates();
        operator.envelope.set_total_level(operator.tl);
        operator.envelope.set_sustain_level(operator.sl);
        operator.update_key_scale_level();

        operator
    }

    #[inline]
    pub fn envelope(&self) -> &EnvelopeGenerator {
        &self.envelope
    }

    #[inline]
    pub fn phase(&self) -> &PhaseGenerator {
        &self.phase
    }

    #[inline]
    pub fn is_off(&self) -> bool {
        self.envelope.stage() == Stage::Off
    }

    /// Feedback coefficient selected by the FB register.
    #[inline]
    pub fn feedback(&self) -> f64 {
        FEEDBACK[self.fb as usize]
    }

    /// Renders one sample. `modulator` is a phase offset in cycles.
    #[inline]
    pub fn next(&mut self, mod_index: usize, modulator: f64) -> f64 {
        if self.is_off() {
            return 0.0;
        }

        let envelope = self.envelope.next(mod_index);
        let phase = self.phase.next(mod_index);

        // Negative offsets below one full table are clamped by the cast.
        let offset = ((modulator + 1024.0) * WAVEFORM_LEN as f64) as u64;
        let index = (phase >> WAVEFORM_INDEX_SHIFT).wrapping_add(offset) as usize & (WAVEFORM_LEN - 1);

        self.tables.waveforms[self.ws as usize][index] * envelope
    }

    pub fn key_on(&mut self) {
        self.phase.reset();

        if self.ar == 0 {
            self.envelope.stop();
        } else {
            self.envelope.key_on();
        }
    }

    pub fn key_off(&mut self) {
        if !self.xof {
            self.envelope.key_off();
        }
    }

    /// Applies new channel frequency registers.
    pub fn set_channel_frequency(&mut self, fnum: u16, block: u8, bo: u8) {
        self.fnum = fnum & 1023;
        self.block = block & 7;
        self.bo = bo & 3;

        self.update_frequency();
        self.update_rates();
        self.update_key_scale_level();
    }

    pub fn set_eam(&mut self, value: bool) {
        self.eam = value;
        self.envelope.set_tremolo(self.eam, self.dam as usize);
    }

    pub fn set_evb(&mut self, value: bool) {
        self.evb = value;
        self.phase.set_vibrato(self.evb, self.dvb as usize);
    }

    pub fn set_dam(&mut self, value: u8) {
        self.dam = value & 3;
        self.envelope.set_tremolo(self.eam, self.dam as usize);
    }

    pub fn set_dvb(&mut self, value: u8) {
        self.dvb = value & 3;
        self.phase.set_vibrato(self.evb, self.dvb as usize);
    }

    pub fn set_dt(&mut self, value: u8) {
        self.dt = value & 7;
        self.update_frequency();
    }

    pub fn set_ksl(&mut self, value: u8) {
        self.ksl = value & 3;
        self.update_key_scale_level();
    }

    pub fn set_ksr(&mut self, value: bool) {
        self.ksr = value;
        self.update_rates();
    }

    pub fn set_ws(&mut self, value: u8) {
        self.ws = value & 31;
    }

    pub fn set_mult(&mut self, value: u8) {
        self.mult = value & 15;
        self.update_frequency();
    }

    pub fn set_fb(&mut self, value: u8) {
        self.fb = value & 7;
    }

    pub fn set_ar(&mut self, value: u8) {
        self.ar = value & 15;
        self.envelope
            .set_attack_rate(self.ar, self.ksr, self.key_scale_number());
    }

    pub fn set_dr(&mut self, value: u8) {
        self.dr = value & 15;
        self.envelope
            .set_decay_rate(self.dr, self.ksr, self.key_scale_number());
    }

    pub fn set_sl(&mut self, value: u8) {
        self.sl = value & 15;
        self.envelope.set_sustain_level(self.sl);
    }

    pub fn set_sr(&mut self, value: u8) {
        self.sr = value & 15;
        self.envelope
            .set_sustain_rate(self.sr, self.ksr, self.key_scale_number());
    }

    pub fn set_rr(&mut self, value: u8) {
        self.rr = value & 15;
        self.envelope
            .set_release_rate(self.rr, self.ksr, self.key_scale_number());
    }

    pub fn set_tl(&mut self, value: u8) {
        self.tl = value & 63;
        self.envelope.set_total_level(self.tl);
    }

    pub fn set_xof(&mut self, value: bool) {
        self.xof = value;
    }

    #[inline]
    fn key_scale_number(&self) -> usize {
        key_scale_number(self.fnum, self.block)
    }

    fn update_frequency(&mut self) {
        self.phase
            .set_frequency(self.fnum, self.block, self.bo, self.mult, self.dt);
    }

    fn update_rates(&mut self) {
        let ksn = self.key_scale_number();
        self.envelope.set_attack_rate(self.ar, self.ksr, ksn);
        self.envelope.set_decay_rate(self.dr, self.ksr, ksn);
        self.envelope.set_sustain_rate(self.sr, self.ksr, ksn);
        self.envelope.set_release_rate(self.rr, self.ksr, ksn);
    }

    fn update_key_scale_level(&mut self) {
        self.envelope
            .set_key_scale_level(self.fnum, self.block, self.ksl);
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const METER: &str = "##########";

        let role = if self.is_modulator { "mod" } else { "car" };
        let level = self.envelope.level() * self.envelope.ceiling();
        let bars = ((level * METER.len() as f64) as usize).min(METER.len());

        write!(
            f,
            "{role} mult={:2} ws={:2} ar={:2} dr={:2} sl={:2} sr={:2} rr={:2} tl={:2} \
             am={} vb={} {:?} [{:<10}]",
            self.mult,
            self.ws,
            self.ar,
            self.dr,
            self.sl,
            self.sr,
            self.rr,
            self.tl,
            if self.eam { self.dam as i32 } else { -1 },
            if self.evb { self.dvb as i32 } else { -1 },
            self.envelope.stage(),
            &METER[..bars],
        )
    }
}
