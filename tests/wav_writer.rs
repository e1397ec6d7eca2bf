//! Writer for rendered chip output

#![allow(dead_code)]

use std::path::PathBuf;

use hound::{SampleFormat, WavSpec, WavWriter};

/// Rate used by tests that don't pick their own.
pub const SAMPLE_RATE: u32 = 48000;

/// Stores interleaved left/right samples below `out/` as a 32-bit float WAV
/// file.
pub fn write(name: &str, sample_rate: u32, interleaved: &[f32]) -> Result<(), hound::Error> {
    let path: PathBuf = ["out", name].iter().collect();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let format = WavSpec {
        channels: 2,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut file = WavWriter::create(&path, format)?;
    interleaved
        .iter()
        .try_for_each(|sample| file.write_sample(*sample))?;
    file.finalize()
}
