use std::f64::consts::TAU;

/*
One-Pole Lowpass
================

The smallest useful IIR filter: every output is a weighted blend of the new
input and the previous output.

    y[n] = a0 * x[n] + b1 * y[n-1]        with a0 = 1 - x, b1 = x

`x` is the feedback coefficient in [0, 1). Close to 1 means heavy smoothing
(slow ramp), 0 means the filter passes its input straight through. Because
a0 + b1 == 1 the DC gain is exactly one, so a constant input is approached
monotonically with no overshoot.

Time Constants
--------------

A decay of L samples means the output covers 1 - 1/e (about 63%) of a step
after L samples:

    x = exp(-1 / L)

A cutoff expressed as normalized frequency fc = f / Fs uses the analog RC
mapping:

    x = exp(-2π * fc)

L == 0 is special-cased to the identity filter (a0 = 1, b1 = 0) so zero-length
ramps never divide by zero.
*/

#[derive(Debug, Clone, Copy)]
pub struct Lowpass {
    a0: f64,
    b1: f64,
    y1: f64, // running output, the only state
    start_val: f64,
}

impl Lowpass {
    /// Identity filter holding `start_val`.
    pub fn new(start_val: f64) -> Self {
        Self {
            a0: 1.0,
            b1: 0.0,
            y1: start_val,
            start_val,
        }
    }

    /// Feedback coefficient for a cutoff in normalized frequency.
    pub fn x_from_fc(fc: f64) -> f64 {
        (-TAU * fc).exp()
    }

    pub fn x_from_hz(hz: f64, sample_rate: f64) -> f64 {
        Self::x_from_fc(hz / sample_rate)
    }

    /// Feedback coefficient for a decay in samples. Non-positive lengths give
    /// the identity coefficient.
    pub fn x_from_samples(length_samples: f64) -> f64 {
        if length_samples <= 0.0 {
            return 0.0;
        }
        (-1.0 / length_samples).exp()
    }

    pub fn x_from_secs(secs: f64, sample_rate: f64) -> f64 {
        Self::x_from_samples(secs * sample_rate)
    }

    pub fn x_from_ms(ms: f64, sample_rate: f64) -> f64 {
        Self::x_from_secs(ms * 0.001, sample_rate)
    }

    pub fn make_from_decay_in_samples(&mut self, samples: f64) {
        self.set_x(Self::x_from_samples(samples));
    }

    pub fn make_from_decay_in_secs(&mut self, secs: f64, sample_rate: f64) {
        self.make_from_decay_in_samples(secs * sample_rate);
    }

    pub fn make_from_decay_in_ms(&mut self, ms: f64, sample_rate: f64) {
        self.make_from_decay_in_secs(ms * 0.001, sample_rate);
    }

    pub fn make_from_decay_in_fc(&mut self, fc: f64) {
        self.set_x(Self::x_from_fc(fc));
    }

    pub fn make_from_decay_in_hz(&mut self, hz: f64, sample_rate: f64) {
        self.set_x(Self::x_from_hz(hz, sample_rate));
    }

    pub fn copy_cutoff_from(&mut self, other: &Lowpass) {
        self.a0 = other.a0;
        self.b1 = other.b1;
    }

    pub fn set_x(&mut self, x: f64) {
        self.a0 = 1.0 - x;
        self.b1 = x;
    }

    /// Reset the running output to the configured start value.
    pub fn reset(&mut self) {
        self.y1 = self.start_val;
    }

    /// Reset the running output without touching the coefficients.
    pub fn reset_to(&mut self, value: f64) {
        self.y1 = value;
    }

    #[inline]
    pub fn process_sample(&mut self, x0: f64) -> f64 {
        self.y1 = x0 * self.a0 + self.y1 * self.b1;
        self.y1
    }

    /// Smooth a block in place.
    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample as f64) as f32;
        }
    }

    /// Fill a block with the filter's response to a constant input.
    pub fn fill(&mut self, buffer: &mut [f32], value: f64) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(value) as f32;
        }
    }

    /// Current output value.
    pub fn value(&self) -> f64 {
        self.y1
    }

    /// Feedback coefficient currently in use.
    pub fn x(&self) -> f64 {
        self.b1
    }

    pub fn coefficients(&self) -> (f64, f64) {
        (self.a0, self.b1)
    }
}

impl Default for Lowpass {
    fn default() -> Self {
        Self::new(0.0)
    }
}
