//! Benchmarks for the resonant bandpass filters.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use onset_dsp::dsp::{Resonator, Resonator2, Resonator3};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

fn run<R: Resonator>(reso: &mut R, buffer: &mut [f32]) {
    for sample in buffer.iter_mut() {
        *sample = reso.process_sample(*sample as f64) as f32;
    }
}

pub fn bench_resonator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/resonator");
    let fc = 1_000.0 / SAMPLE_RATE;
    let bw = 120.0 / SAMPLE_RATE;

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();
        let mut buffer = input.clone();

        let mut reso = Resonator2::new(fc, bw);
        group.bench_with_input(BenchmarkId::new("two_pole", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                run(&mut reso, black_box(&mut buffer));
            })
        });

        // Two-pole plus the DC-removing lowpass
        let mut reso = Resonator3::new(fc, bw);
        group.bench_with_input(BenchmarkId::new("dc_blocked", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                run(&mut reso, black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
