//! Whole-detector benchmarks.
//!
//! These feed the detector the kind of audio it sees in practice: mostly
//! steady material with the occasional transient.

mod detector;

pub use detector::{bench_band_count, bench_detector};
