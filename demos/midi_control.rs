//! 16-channel FM synth played from a MIDI input.

use audio_midi_shell::{AudioGenerator, AudioMidiShell};
use simple_logger::SimpleLogger;

use ma5_fm_dsp::chip::Chip;
use ma5_fm_dsp::controller::midi::MidiMessage;
use ma5_fm_dsp::controller::{Controller, ControllerOptions};
use ma5_fm_dsp::voice::{FmOperator, FmVoice, Voice, VoiceLibrary, VoiceProgram};

const SAMPLE_RATE: u32 = 48000;
const BLOCK_SIZE: usize = 32;

/// Undefined controller used to dump the channel status.
const STATUS_CC: u8 = 119;

fn main() -> ! {
    SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init()
        .unwrap();

    AudioMidiShell::run_forever(SAMPLE_RATE, BLOCK_SIZE, App::new());
}

struct App {
    controller: Controller<'static, Chip>,
    frame: u64,
}

impl App {
    pub fn new() -> Self {
        let library: &'static VoiceLibrary = Box::leak(Box::new(library()));
        let chip = Chip::new(SAMPLE_RATE as f64, -6.0);

        Self {
            controller: Controller::new(chip, library, ControllerOptions::default()),
            frame: 0,
        }
    }
}

impl AudioGenerator for App {
    fn init(&mut self, _block_size: usize) {
        self.controller.reset();
        log::info!("Programs: 0 Organ, 1 Bass, 2 Bell");
    }

    fn process(&mut self, samples_left: &mut [f32], samples_right: &mut [f32]) {
        self.controller.flush_midi_messages(self.frame);
        self.controller
            .registers_mut()
            .render(samples_left, samples_right);

        self.frame += samples_left.len() as u64;
    }

    fn process_midi(&mut self, message: Vec<u8>) {
        match MidiMessage::from_bytes(&message) {
            Some(MidiMessage::ControlChange {
                control: STATUS_CC,
                channel,
                ..
            }) => {
                log::info!("Status requested on channel {}", channel + 1);
                self.controller.log_status();
            }
            Some(message) => self.controller.push_midi_message(self.frame, message),
            None => log::debug!("Ignored MIDI message: {:02X?}", message),
        }
    }
}

fn library() -> VoiceLibrary {
    let drawbar = |mult| FmOperator {
        mult,
        ar: 15,
        sl: 0,
        rr: 9,
        tl: 6,
        ..Default::default()
    };

    let organ = FmVoice {
        lfo: 1,
        alg: 2,
        operators: vec![drawbar(1), drawbar(2), drawbar(4), drawbar(6)],
        ..Default::default()
    };

    let bass = FmVoice {
        alg: 0,
        operators: vec![
            FmOperator {
                mult: 1,
                fb: 5,
                ar: 15,
                dr: 8,
                sl: 6,
                sr: 3,
                rr: 8,
                tl: 18,
                ..Default::default()
            },
            FmOperator {
                mult: 1,
                ar: 15,
                dr: 4,
                sl: 2,
                sr: 2,
                rr: 8,
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    let bell = FmVoice {
        alg: 4,
        operators: vec![
            FmOperator {
                mult: 7,
                ar: 15,
                dr: 5,
                sl: 15,
                rr: 5,
                tl: 24,
                ..Default::default()
            },
            FmOperator {
                mult: 2,
                dt: 2,
                ar: 15,
                dr: 4,
                sl: 15,
                rr: 4,
                tl: 20,
                ..Default::default()
            },
            FmOperator {
                mult: 1,
                ar: 15,
                dr: 3,
                sl: 15,
                rr: 4,
                tl: 16,
                ..Default::default()
            },
            FmOperator {
                mult: 1,
                ar: 15,
                dr: 2,
                sl: 15,
                rr: 3,
                ..Default::default()
            },
        ],
        ..Default::default()
    };

    [("Organ", organ), ("Bass", bass), ("Bell", bell)]
        .into_iter()
        .enumerate()
        .map(|(program, (name, voice))| VoiceProgram {
            name: name.to_string(),
            bank_msb: 0,
            bank_lsb: 0,
            program: program as u8,
            drum_note: 0,
            voice: Voice::Fm(voice),
        })
        .collect()
}
