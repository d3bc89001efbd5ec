//! Benchmarks for low-level DSP primitives.

mod envelope;
mod lowpass;
mod resonator;

pub use envelope::bench_envelope;
pub use lowpass::bench_lowpass;
pub use resonator::bench_resonator;
