//! Benchmarks for the one-pole lowpass.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use onset_dsp::dsp::Lowpass;

use crate::{BLOCK_SIZES, SAMPLE_RATE};

pub fn bench_lowpass(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/lowpass");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut buffer = input.clone();

        let mut lp = Lowpass::new(0.0);
        lp.make_from_decay_in_ms(5.0, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("render", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                lp.render(black_box(&mut buffer));
            })
        });

        // Smoothing towards a constant target (parameter glide)
        let mut lp = Lowpass::new(0.0);
        lp.make_from_decay_in_ms(20.0, SAMPLE_RATE);
        group.bench_with_input(BenchmarkId::new("fill", size), &size, |b, _| {
            b.iter(|| {
                lp.fill(black_box(&mut buffer), black_box(1.0));
            })
        });
    }

    group.finish();
}
