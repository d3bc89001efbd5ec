use std::ops::{Index, IndexMut};

use crate::MAX_BLOCK_SIZE;

/// Fixed-capacity mono sample block.
///
/// Every component that needs scratch space owns one of these, sized to
/// `MAX_BLOCK_SIZE` at construction, so nothing resizes on the audio thread.
/// Operations take the number of live samples explicitly; anything past that
/// count is stale and never read.
#[derive(Clone)]
pub struct BlockBuffer {
    samples: [f32; MAX_BLOCK_SIZE],
}

impl BlockBuffer {
    pub fn new() -> Self {
        Self {
            samples: [0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn copy_from(&mut self, other: &BlockBuffer, num_samples: usize) {
        self.samples[..num_samples].copy_from_slice(&other.samples[..num_samples]);
    }

    pub fn copy_from_slice(&mut self, input: &[f32]) {
        self.samples[..input.len()].copy_from_slice(input);
    }

    /// Mix planar channels to mono, reading `num_samples` frames from `offset`.
    ///
    /// A single channel is copied as-is. With two or more channels the first
    /// two are averaged: (L + R) * 0.5.
    pub fn copy_from_mid(&mut self, channels: &[&[f32]], offset: usize, num_samples: usize) {
        let out = &mut self.samples[..num_samples];
        match channels {
            [] => out.fill(0.0),
            [mono] => out.copy_from_slice(&mono[offset..offset + num_samples]),
            [left, right, ..] => {
                let left = &left[offset..offset + num_samples];
                let right = &right[offset..offset + num_samples];
                for ((o, &l), &r) in out.iter_mut().zip(left).zip(right) {
                    *o = (l + r) * 0.5;
                }
            }
        }
    }

    /// Interleaved counterpart of [`copy_from_mid`](Self::copy_from_mid).
    /// `frame_offset` and `num_samples` count frames, not raw samples.
    pub fn copy_from_interleaved(
        &mut self,
        data: &[f32],
        num_channels: usize,
        frame_offset: usize,
        num_samples: usize,
    ) {
        let out = &mut self.samples[..num_samples];
        if num_channels == 0 {
            out.fill(0.0);
            return;
        }

        let frames = data[frame_offset * num_channels..].chunks_exact(num_channels);
        for (o, frame) in out.iter_mut().zip(frames) {
            *o = match frame {
                [mono] => *mono,
                [left, right, ..] => (left + right) * 0.5,
                [] => 0.0,
            };
        }
    }

    /// Broadcast the mono block to every output channel.
    pub fn copy_to(&self, channels: &mut [&mut [f32]], num_samples: usize) {
        for channel in channels.iter_mut() {
            channel[..num_samples].copy_from_slice(&self.samples[..num_samples]);
        }
    }

    pub fn rectify(&mut self, num_samples: usize) {
        for sample in &mut self.samples[..num_samples] {
            *sample = sample.abs();
        }
    }

    /// Largest value in the block (the buffer is expected to hold magnitudes).
    pub fn max_magnitude(&self, num_samples: usize) -> f32 {
        self.samples[..num_samples]
            .iter()
            .fold(0.0f32, |acc, &x| acc.max(x))
    }

    pub fn clear(&mut self, num_samples: usize) {
        self.samples[..num_samples].fill(0.0);
    }

    pub fn as_slice(&self, num_samples: usize) -> &[f32] {
        &self.samples[..num_samples]
    }

    pub fn as_mut_slice(&mut self, num_samples: usize) -> &mut [f32] {
        &mut self.samples[..num_samples]
    }
}

impl Default for BlockBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<usize> for BlockBuffer {
    type Output = f32;

    fn index(&self, i: usize) -> &f32 {
        &self.samples[i]
    }
}

impl IndexMut<usize> for BlockBuffer {
    fn index_mut(&mut self, i: usize) -> &mut f32 {
        &mut self.samples[i]
    }
}
