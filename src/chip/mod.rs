//! The synthesizer chip: 16 channels mixed into a stereo output.

pub mod registers;

#[allow(unused_imports)]
use num_traits::float::Float;

use crate::fm::channel::Channel;
use crate::{SampleRate, CHANNEL_COUNT};

#[derive(Debug, Clone)]
pub struct Chip {
    sample_rate: SampleRate,
    total_level: f64,
    channels: [Channel; CHANNEL_COUNT],
}

impl Chip {
    /// Creates a chip rendering at `sample_rate` Hz with an output gain of
    /// `total_level_db`.
    pub fn new(sample_rate: f64, total_level_db: f64) -> Self {
        let sample_rate = SampleRate::new(sample_rate);

        Self {
            sample_rate,
            total_level: 10f64.powf(total_level_db / 20.0),
            channels: core::array::from_fn(|_| Channel::new(sample_rate)),
        }
    }

    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate.sample_rate_hz
    }

    #[inline]
    pub fn channel(&self, index: usize) -> &Channel {
        &self.channels[index]
    }

    #[inline]
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    /// Renders one stereo sample.
    #[inline]
    pub fn next(&mut self) -> (f32, f32) {
        let mut left = 0.0;
        let mut right = 0.0;

        for channel in self.channels.iter_mut() {
            let (l, r) = channel.next();
            left += l;
            right += r;
        }

        (
            (left * self.total_level) as f32,
            (right * self.total_level) as f32,
        )
    }

    /// Renders a block of samples. Both buffers should have the same length.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            (*l, *r) = self.next();
        }
    }

    /// Logs the operators of every audible channel at debug level.
    pub fn log_channels(&self) {
        for (i, channel) in self.channels.iter().enumerate() {
            if channel.current_level() <= crate::fm::envelope::SILENCE {
                continue;
            }

            log::debug!("ch{i:02} alg={}", channel.algorithm().index());
            for op in channel.operators() {
                log::debug!("  {op}");
            }
        }
    }

    #[inline]
    fn channel_mut(&mut self, index: usize) -> Option<&mut Channel> {
        let channel = self.channels.get_mut(index);
        if channel.is_none() {
            log::error!("Channel index out of range: {index}");
        }
        channel
    }
}
