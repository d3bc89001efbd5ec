//! Benchmarks for the attack/decay envelope follower.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use onset_dsp::dsp::EnvelopeFollower;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");

    for &size in BLOCK_SIZES {
        // Decaying clicks force a stage switch every few samples
        let input: Vec<f32> = (0..size)
            .map(|i| if i % 32 == 0 { 1.0 } else { 0.1 })
            .collect();

        let mut env = EnvelopeFollower::with_times(1.0, 10.0);
        env.prepare(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("mono", size), &size, |b, _| {
            b.iter(|| {
                env.process_mono(black_box(&input));
            })
        });

        // Stereo input, mixed to mid before following
        let right: Vec<f32> = input.iter().map(|x| -x).collect();
        let channels: [&[f32]; 2] = [&input, &right];
        let mut env = EnvelopeFollower::with_times(1.0, 10.0);
        env.prepare(SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("stereo", size), &size, |b, _| {
            b.iter(|| {
                env.process(black_box(&channels), size);
            })
        });
    }

    group.finish();
}
