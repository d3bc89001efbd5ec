//! Errors raised when configuring the detector.
//!
//! The processing path itself never fails; these only come out of the
//! whole-config entry points (`DetectorConfig::validate`,
//! `OnsetDetector::with_config`, `OnsetDetector::apply_config`).

use thiserror::Error;

use crate::MAX_BANDS;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("band count {0} is outside 1..={max}", max = MAX_BANDS)]
    BandCount(usize),

    #[error("pitch range {lowest}..{highest} is empty or inverted")]
    PitchRange { lowest: f32, highest: f32 },

    #[error("{name} must be finite and within range, got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("sample rate must be positive and finite, got {0}")]
    SampleRate(f64),
}
