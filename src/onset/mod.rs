//! Onset detection built on the `dsp` primitives.

/// One resonator band with its fast and slow envelope followers.
pub mod core;
/// The band bank, aggregation and threshold decision.
pub mod detector;
/// Minimum-spacing gate between reported onsets.
pub mod hold;

pub use self::core::OnsetCore;
pub use detector::OnsetDetector;
pub use hold::OnsetStrongHold;
