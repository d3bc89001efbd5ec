//! Benchmarks for the full onset detector.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use onset_dsp::{DetectorConfig, OnsetDetector};

use crate::{BLOCK_SIZES, SAMPLE_RATE};

/// A 220 Hz tone with a click every 128 samples.
fn test_signal(size: usize) -> Vec<f32> {
    (0..size)
        .map(|i| {
            let t = i as f64 / SAMPLE_RATE;
            let tone = (std::f64::consts::TAU * 220.0 * t).sin() as f32 * 0.3;
            if i % 128 == 0 {
                tone + 0.6
            } else {
                tone
            }
        })
        .collect()
}

fn detector(num_bands: usize) -> OnsetDetector {
    let config = DetectorConfig {
        num_bands,
        ..Default::default()
    };
    // benches only run valid configs
    OnsetDetector::with_config(&config, SAMPLE_RATE).unwrap()
}

pub fn bench_detector(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/detector");

    for &size in BLOCK_SIZES {
        let left = test_signal(size);
        let right: Vec<f32> = left.iter().map(|x| x * 0.8).collect();
        let interleaved: Vec<f32> = left.iter().zip(&right).flat_map(|(&l, &r)| [l, r]).collect();
        let mono_channels: [&[f32]; 1] = [&left];
        let stereo_channels: [&[f32]; 2] = [&left, &right];

        let mut mono = detector(8);
        group.bench_with_input(BenchmarkId::new("mono", size), &size, |b, _| {
            b.iter(|| black_box(mono.process(black_box(&mono_channels))))
        });

        let mut stereo = detector(8);
        group.bench_with_input(BenchmarkId::new("stereo", size), &size, |b, _| {
            b.iter(|| black_box(stereo.process(black_box(&stereo_channels))))
        });

        let mut inter = detector(8);
        group.bench_with_input(BenchmarkId::new("interleaved", size), &size, |b, _| {
            b.iter(|| black_box(inter.process_interleaved(black_box(&interleaved), 2)))
        });
    }

    group.finish();
}

pub fn bench_band_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/band_count");
    let size = 256;
    let input = test_signal(size);
    let channels: [&[f32]; 1] = [&input];

    for num_bands in [1, 8, 16, 32] {
        let mut detector = detector(num_bands);
        group.bench_with_input(BenchmarkId::new("bands", num_bands), &num_bands, |b, _| {
            b.iter(|| black_box(detector.process(black_box(&channels))))
        });
    }

    group.finish();
}
