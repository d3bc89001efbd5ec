//! Low-level DSP primitives used by the onset detector.
//!
//! These components are allocation-free and realtime-safe once constructed,
//! making them safe to embed directly inside the band units. They stay focused
//! on the signal-processing math; the `onset` module layers aggregation and
//! event decisions on top.

/// Fixed-capacity sample buffer sized to one processing block.
pub mod buffer;
/// Unit conversions (dB, milliseconds, samples, pitch).
pub mod convert;
/// Rectify-and-smooth envelope follower with attack/decay switching.
pub mod envelope;
/// One-pole exponential smoothing filter.
pub mod lowpass;
/// Narrow two-pole resonant bandpass filters.
pub mod resonator;

pub use buffer::BlockBuffer;
pub use envelope::EnvelopeFollower;
pub use lowpass::Lowpass;
pub use resonator::{Resonator, Resonator2, Resonator3, ResonatorStereo};
