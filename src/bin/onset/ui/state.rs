//! Shared state types for UI communication
//!
//! Static facts about the stream are handed over once at startup; per-callback
//! meter readings are Copy so the audio thread never allocates to send them.

use onset_dsp::MAX_BANDS;

/// Static stream info, built before the audio stream starts (can allocate)
#[derive(Clone)]
pub struct StreamInfo {
    /// Input device name
    pub device_name: String,
    /// Audio sample rate in Hz
    pub sample_rate: f64,
    /// Interleaved channel count of the input stream
    pub channels: usize,
}

/// Detector readings for one audio callback (allocation-free, Copy)
#[derive(Clone, Copy, Debug)]
pub struct MeterUpdate {
    /// Highest aggregate strength in the callback
    pub strength_peak: f32,
    /// Linear threshold the strength is compared against
    pub threshold: f32,
    /// Whether the callback contained an onset
    pub onset: bool,
    /// Number of active bands
    pub num_bands: u8,
    /// Peak band strength per active band
    pub band_levels: [f32; MAX_BANDS],
    /// Band centre frequencies in Hz
    pub band_freqs: [f32; MAX_BANDS],
}

impl MeterUpdate {
    pub fn new() -> Self {
        Self {
            strength_peak: 0.0,
            threshold: 1.0,
            onset: false,
            num_bands: 0,
            band_levels: [0.0; MAX_BANDS],
            band_freqs: [0.0; MAX_BANDS],
        }
    }

    /// Active slice of `band_levels` paired with centre frequencies.
    pub fn bands(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        let n = self.num_bands as usize;
        self.band_freqs[..n]
            .iter()
            .copied()
            .zip(self.band_levels[..n].iter().copied())
    }
}

impl Default for MeterUpdate {
    fn default() -> Self {
        Self::new()
    }
}

/// One input frame for the trace, mixed to mono
#[derive(Clone, Copy, Debug, Default)]
pub struct InputFrame {
    pub mid: f32,
    /// The detector reported an onset on this frame
    pub onset: bool,
}
