//! Tests for the chip driven through the controller.

mod modulation;
mod patches;
mod wav_writer;

use ma5_fm_dsp::chip::registers::{ChRegister, OpRegister, Registers};
use ma5_fm_dsp::chip::Chip;
use ma5_fm_dsp::controller::midi::MidiMessage;
use ma5_fm_dsp::controller::{Controller, ControllerOptions};
use ma5_fm_dsp::fm::envelope::Stage;
use ma5_fm_dsp::voice::{FmOperator, FmVoice, Voice, VoiceLibrary};
use ma5_fm_dsp::CHANNEL_COUNT;

use wav_writer::SAMPLE_RATE;

const BLOCK_SIZE: usize = 64;

fn render(chip: &mut Chip, seconds: f64, wav_data: &mut Vec<f32>) {
    let blocks = (seconds * SAMPLE_RATE as f64 / BLOCK_SIZE as f64) as usize;
    let mut left = [0.0; BLOCK_SIZE];
    let mut right = [0.0; BLOCK_SIZE];

    for _ in 0..blocks {
        chip.render(&mut left, &mut right);
        for (l, r) in left.iter().zip(right.iter()) {
            wav_data.push(*l);
            wav_data.push(*r);
        }
    }
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0, |peak, s| peak.max(s.abs()))
}

#[test]
fn silent_when_idle() {
    let mut chip = Chip::new(SAMPLE_RATE as f64, 0.0);

    for _ in 0..1000 {
        assert_eq!(chip.next(), (0.0, 0.0));
    }
}

#[test]
fn note_on_binds_free_channel_and_attacks() {
    let library = patches::library();
    let chip = Chip::new(SAMPLE_RATE as f64, 0.0);
    let mut controller = Controller::new(chip, &library, ControllerOptions::default());

    controller.program_change(0, 1);
    controller.note_on(0, 60, 127);

    let state = controller.chip_channel_state(0);
    assert_eq!(state.midi_channel, Some(0));
    assert_eq!(state.note, 60);
    assert!(!state.is_free());

    let chip = controller.registers_mut();
    let carrier = chip.channel(0).operator(3);
    assert_eq!(carrier.envelope().stage(), Stage::Attack);
    let ceiling = carrier.envelope().ceiling();

    let mut previous = 0.0;
    let mut wav_data = Vec::new();
    for _ in 0..SAMPLE_RATE / 10 {
        let (l, r) = chip.next();
        wav_data.push(l);
        wav_data.push(r);

        let envelope = chip.channel(0).operator(3).envelope();
        let level = envelope.level() * envelope.ceiling();
        assert!(level >= previous);
        assert!(level <= ceiling);
        previous = level;
    }
    assert!(previous > 0.0);

    wav_writer::write("chip/attack.wav", SAMPLE_RATE, &wav_data).ok();
}

#[test]
fn note_off_during_attack_releases() {
    let library = patches::library();
    let chip = Chip::new(SAMPLE_RATE as f64, 0.0);
    let mut controller = Controller::new(chip, &library, ControllerOptions::default());

    controller.program_change(0, 1);
    controller.note_on(0, 64, 100);

    for _ in 0..200 {
        controller.registers_mut().next();
    }

    let reached = {
        let envelope = controller.registers().channel(0).operator(0).envelope();
        assert_eq!(envelope.stage(), Stage::Attack);
        envelope.level()
    };

    controller.note_off(0, 64);

    let envelope = controller.registers().channel(0).operator(0).envelope();
    assert_eq!(envelope.stage(), Stage::Release);

    for _ in 0..SAMPLE_RATE {
        controller.registers_mut().next();
        let level = controller.registers().channel(0).operator(0).envelope().level();
        assert!(level <= reached);
    }
}

#[test]
fn default_patch_is_silent() {
    let library = VoiceLibrary::new();
    let chip = Chip::new(SAMPLE_RATE as f64, 0.0);
    let mut controller = Controller::new(chip, &library, ControllerOptions::default());

    controller.note_on(0, 60, 127);
    assert_eq!(controller.chip_channel_state(0).midi_channel, Some(0));

    for _ in 0..1000 {
        assert_eq!(controller.registers_mut().next(), (0.0, 0.0));
    }
}

#[test]
fn all_algorithms() {
    let mut wav_data = Vec::new();

    for alg in 0..8 {
        let operator = FmOperator {
            mult: 1,
            fb: 4,
            ar: 14,
            dr: 4,
            sl: 3,
            sr: 2,
            rr: 7,
            tl: 12,
            ..Default::default()
        };
        let voice = FmVoice {
            alg,
            operators: vec![operator; 4],
            ..Default::default()
        };
        let library: VoiceLibrary = [patches::program("Alg", 0, 0, Voice::Fm(voice))]
            .into_iter()
            .collect();

        let chip = Chip::new(SAMPLE_RATE as f64, 0.0);
        let mut controller = Controller::new(chip, &library, ControllerOptions::default());
        controller.note_on(0, 57, 110);

        let start = wav_data.len();
        render(controller.registers_mut(), 0.5, &mut wav_data);
        controller.note_off(0, 57);
        render(controller.registers_mut(), 0.5, &mut wav_data);

        let samples = &wav_data[start..];
        assert!(samples.iter().all(|s| s.is_finite()), "alg {alg}");
        assert!(peak(samples) > 0.01, "alg {alg}");
        assert!(peak(samples) <= 4.0, "alg {alg}");
    }

    wav_writer::write("chip/algorithms.wav", SAMPLE_RATE, &wav_data).ok();
}

#[test]
fn early_exit_when_carriers_off() {
    let mut chip = Chip::new(SAMPLE_RATE as f64, 0.0);

    // Only the modulator of ALG 0 has an attack rate, so the carrier stays off.
    chip.write_channel(0, ChRegister::Alg, 0);
    chip.write_operator(0, 0, OpRegister::Ar, 15);
    chip.write_operator(0, 1, OpRegister::Ar, 0);
    chip.write_channel(0, ChRegister::Volume, 127);
    chip.write_channel(0, ChRegister::Expression, 127);
    chip.write_channel(0, ChRegister::Velocity, 127);
    chip.write_channel(0, ChRegister::Fnum, 601);
    chip.write_channel(0, ChRegister::Block, 4);
    chip.write_channel(0, ChRegister::Kon, 1);

    assert_eq!(chip.channel(0).operator(1).envelope().stage(), Stage::Off);

    let phase = chip.channel(0).operator(0).phase().phase();
    for _ in 0..100 {
        assert_eq!(chip.next(), (0.0, 0.0));
    }
    assert_eq!(chip.channel(0).operator(0).phase().phase(), phase);
}

#[test]
fn xof_operator_ignores_key_off() {
    let mut chip = Chip::new(SAMPLE_RATE as f64, 0.0);

    chip.write_channel(0, ChRegister::Alg, 1);
    for op in 0..2 {
        chip.write_operator(0, op, OpRegister::Ar, 15);
        chip.write_operator(0, op, OpRegister::Sl, 2);
        chip.write_operator(0, op, OpRegister::Rr, 8);
    }
    chip.write_operator(0, 0, OpRegister::Xof, 1);
    chip.write_channel(0, ChRegister::Fnum, 601);
    chip.write_channel(0, ChRegister::Block, 4);
    chip.write_channel(0, ChRegister::Kon, 1);

    for _ in 0..100 {
        chip.next();
    }
    chip.write_channel(0, ChRegister::Kon, 0);

    let held = chip.channel(0).operator(0).envelope().stage();
    assert_ne!(held, Stage::Release);
    assert_ne!(held, Stage::Off);
    assert_eq!(chip.channel(0).operator(1).envelope().stage(), Stage::Release);
}

#[test]
fn pan_law_is_equal_power() {
    let mut chip = Chip::new(SAMPLE_RATE as f64, 0.0);

    for chpan in [0u16, 32, 64, 100, 127] {
        chip.write_channel(0, ChRegister::Chpan, chpan);
        let (l, r) = chip.channel(0).pan_gains();
        assert!((l * l + r * r - 1.0).abs() < 1e-9);
    }

    chip.write_channel(0, ChRegister::Chpan, 0);
    let (l, r) = chip.channel(0).pan_gains();
    assert!((l - 1.0).abs() < 1e-9 && r.abs() < 1e-9);

    chip.write_channel(0, ChRegister::Chpan, 64);
    chip.write_channel(0, ChRegister::Panpot, 31);
    let (l, r) = chip.channel(0).pan_gains();
    assert!(r > l);
}

#[test]
fn total_level_scales_output() {
    let library = patches::library();

    let mut outputs = Vec::new();
    for total_level in [0.0, -6.0] {
        let chip = Chip::new(SAMPLE_RATE as f64, total_level);
        let mut controller = Controller::new(chip, &library, ControllerOptions::default());
        controller.note_on(0, 60, 127);

        let mut wav_data = Vec::new();
        render(controller.registers_mut(), 0.1, &mut wav_data);
        outputs.push(peak(&wav_data));
    }

    let ratio = outputs[1] / outputs[0];
    assert!((ratio - 10f32.powf(-6.0 / 20.0)).abs() < 1e-3);
}

#[test]
fn pitch_bend_sweep() {
    let library = patches::library();
    let chip = Chip::new(SAMPLE_RATE as f64, 0.0);
    let mut controller = Controller::new(chip, &library, ControllerOptions::default());
    let mut wav_data = Vec::new();

    controller.control_change(0, 1, 100);
    controller.note_on(0, 57, 100);

    let block_count = 750;
    for n in 0..block_count {
        let bend = modulation::pitch_bend(modulation::triangle(n, block_count, 2.0));
        controller.pitch_bend(0, bend);
        render(controller.registers_mut(), BLOCK_SIZE as f64 / SAMPLE_RATE as f64, &mut wav_data);
    }

    assert!(wav_data.iter().all(|s| s.is_finite()));
    wav_writer::write("chip/pitch_bend.wav", SAMPLE_RATE, &wav_data).ok();
}

#[test]
fn polyphony_stress() {
    simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Warn)
        .init()
        .ok();

    let library = patches::library();
    let chip = Chip::new(44100.0, -6.0);
    let mut controller = Controller::new(chip, &library, ControllerOptions::default());
    let mut wav_data = Vec::new();
    let mut frame = 0u64;

    for step in 0..64u64 {
        let channel = (step % 3) as u8;
        let note = 36 + ((step * 7) % 48) as u8;

        controller.push_midi_message(
            frame,
            MidiMessage::ProgramChange {
                channel,
                program: (step % 3) as u8,
            },
        );
        controller.push_midi_message(
            frame,
            MidiMessage::NoteOn {
                channel,
                note,
                velocity: 100,
            },
        );
        controller.push_midi_message(frame + 2000, MidiMessage::NoteOff { channel, note });

        frame += BLOCK_SIZE as u64 * 8;
        controller.flush_midi_messages(frame);
        render(controller.registers_mut(), BLOCK_SIZE as f64 * 8.0 / 44100.0, &mut wav_data);
    }

    let bound = (0..CHANNEL_COUNT)
        .filter(|&i| controller.chip_channel_state(i).midi_channel.is_some())
        .count();
    assert!(bound <= CHANNEL_COUNT);
    assert!(wav_data.iter().all(|s| s.is_finite()));

    wav_writer::write("chip/stress.wav", 44100, &wav_data).ok();
}
