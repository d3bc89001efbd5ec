use crate::{config::DEFAULT_HOLD_MS, dsp::convert::ms_to_samples};

/// Minimum-spacing gate between onsets.
///
/// The timer counts samples since the last above-threshold sample. The gate is
/// open once the timer has reached the hold length. Both `prepare` and
/// `set_length` zero the timer, so a fresh gate starts closed.
#[derive(Debug, Clone)]
pub struct OnsetStrongHold {
    sample_rate: f64,
    length_ms: f64,
    length: usize,
    timer: usize,
}

impl OnsetStrongHold {
    pub fn new() -> Self {
        let mut hold = Self {
            sample_rate: 1.0,
            length_ms: DEFAULT_HOLD_MS,
            length: 0,
            timer: 0,
        };
        hold.set_length(DEFAULT_HOLD_MS);
        hold
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.set_length(self.length_ms);
    }

    /// Set the hold length in milliseconds. Negative values mean no hold.
    pub fn set_length(&mut self, ms: f64) {
        self.length_ms = ms.max(0.0);
        self.length = ms_to_samples(self.length_ms, self.sample_rate) as usize;
        self.timer = 0;
    }

    /// Count `num_samples` towards the hold length.
    #[inline]
    pub fn advance(&mut self, num_samples: usize) {
        self.timer = self.timer.saturating_add(num_samples);
    }

    /// Restart the hold; called on every above-threshold sample.
    #[inline]
    pub fn reset(&mut self) {
        self.timer = 0;
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.timer >= self.length
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        !self.is_open()
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn length_ms(&self) -> f64 {
        self.length_ms
    }

    pub fn timer(&self) -> usize {
        self.timer
    }
}

impl Default for OnsetStrongHold {
    fn default() -> Self {
        Self::new()
    }
}
