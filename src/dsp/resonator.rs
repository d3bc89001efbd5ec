use std::f64::consts::TAU;

use crate::dsp::lowpass::Lowpass;

/*
Two-Pole Resonator
==================

A narrow bandpass that rings at its centre frequency. Each band of the onset
detector owns one; its job is to isolate the energy near one pitch.

Parameters (both normalized to the sample rate, 0.5 = Nyquist):

  fc   centre frequency
  bw   bandwidth; sets how fast the ringing dies away

Coefficients
------------

    b2 = exp(-2π * bw)                      pole radius squared
    b1 = -4 * b2 / (1 + b2) * cos(2π * fc)  pole angle
    a0 = (1 - b2) * sqrt(1 - b1² / (4 * b2)) gain normalization

    y[n] = a0 * x[n] - b1 * y[n-1] - b2 * y[n-2]

The radicand 1 - b1²/(4·b2) is non-negative in exact arithmetic, but rounding
can push it a hair below zero, and a bandwidth so large that b2 underflows makes
it 0/0. It is clamped to [0, 1], with b2 == 0 treated as radicand 1, so the
coefficients always stay finite. fc is clamped to [0, 0.5] and bw to >= 0
before deriving anything.

Output is hard-clipped to [-1, 1] before it is written back into the delay
line, so an unstable configuration cannot run away. A non-finite result (NaN
or infinite input) is written back as 0; the band goes quiet for that sample
and rings on normally afterwards.

Resonator3 additionally subtracts a one-pole lowpass (cutoff tracking fc) of
its own output. The rectified input the detector feeds in carries a large DC
component; this removes what leaks through and sharpens the band.

Coefficients are derived in `update()`, never in the setters: set cutoff and
bandwidth, then commit with `update()`.
*/

/// Capabilities shared by every resonator flavour.
pub trait Resonator: Default + Send {
    /// Clear delay registers; coefficients are kept.
    fn reset(&mut self);

    /// Recompute coefficients from the current cutoff and bandwidth.
    fn update(&mut self);

    fn set_cutoff_fc(&mut self, fc: f64);

    fn set_bandwidth(&mut self, bw: f64);

    /// Take over another resonator's coefficients (not its state).
    fn copy_from(&mut self, other: &Self);

    fn process_sample(&mut self, x: f64) -> f64;
}

/// Cutoff and bandwidth storage plus the output clamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResonatorBase {
    pub fc: f64,
    pub bw: f64,
}

impl ResonatorBase {
    #[inline]
    pub fn distort(&self, y: f64) -> f64 {
        if y.is_finite() { y.clamp(-1.0, 1.0) } else { 0.0 }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resonator2 {
    base: ResonatorBase,
    b2: f64,
    b1: f64,
    a0: f64,
    z1: f64,
    z2: f64,
}

impl Resonator2 {
    pub fn new(fc: f64, bw: f64) -> Self {
        let mut reso = Self::default();
        reso.set_cutoff_fc(fc);
        reso.set_bandwidth(bw);
        reso.update();
        reso
    }

    pub fn cutoff_fc(&self) -> f64 {
        self.base.fc
    }

    pub fn bandwidth(&self) -> f64 {
        self.base.bw
    }

    /// (a0, b1, b2)
    pub fn coefficients(&self) -> (f64, f64, f64) {
        (self.a0, self.b1, self.b2)
    }
}

impl Resonator for Resonator2 {
    fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    fn update(&mut self) {
        let fc = self.base.fc.clamp(0.0, 0.5);
        let bw = self.base.bw.max(0.0);

        self.b2 = (-TAU * bw).exp();
        let b2_4 = 4.0 * self.b2;
        self.b1 = (-b2_4 / (1.0 + self.b2)) * (TAU * fc).cos();
        let radicand = if b2_4 > 0.0 {
            (1.0 - self.b1 * self.b1 / b2_4).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.a0 = (1.0 - self.b2) * radicand.sqrt();
    }

    fn set_cutoff_fc(&mut self, fc: f64) {
        self.base.fc = fc;
    }

    fn set_bandwidth(&mut self, bw: f64) {
        self.base.bw = bw;
    }

    fn copy_from(&mut self, other: &Self) {
        self.base = other.base;
        self.b2 = other.b2;
        self.b1 = other.b1;
        self.a0 = other.a0;
    }

    #[inline]
    fn process_sample(&mut self, x: f64) -> f64 {
        let y = self.a0 * x - self.b1 * self.z1 - self.b2 * self.z2;
        let y = self.base.distort(y);
        self.z2 = self.z1;
        self.z1 = y;
        y
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resonator3 {
    reso: Resonator2,
    lp: Lowpass,
}

impl Resonator3 {
    pub fn new(fc: f64, bw: f64) -> Self {
        let mut reso = Self::default();
        reso.set_cutoff_fc(fc);
        reso.set_bandwidth(bw);
        reso.update();
        reso
    }

    pub fn cutoff_fc(&self) -> f64 {
        self.reso.cutoff_fc()
    }

    pub fn bandwidth(&self) -> f64 {
        self.reso.bandwidth()
    }
}

impl Resonator for Resonator3 {
    fn reset(&mut self) {
        self.reso.reset();
        self.lp.reset();
    }

    fn update(&mut self) {
        self.reso.update();
        self.lp.make_from_decay_in_fc(self.reso.cutoff_fc().clamp(0.0, 0.5));
    }

    fn set_cutoff_fc(&mut self, fc: f64) {
        self.reso.set_cutoff_fc(fc);
    }

    fn set_bandwidth(&mut self, bw: f64) {
        self.reso.set_bandwidth(bw);
    }

    fn copy_from(&mut self, other: &Self) {
        self.reso.copy_from(&other.reso);
        self.lp.copy_cutoff_from(&other.lp);
    }

    #[inline]
    fn process_sample(&mut self, x: f64) -> f64 {
        let y = self.reso.process_sample(x);
        y - self.lp.process_sample(y)
    }
}

/// Two independent channels of the same resonator flavour.
///
/// `update_channel` tunes one side on its own; `update` tunes channel 0 and
/// copies its coefficients to channel 1, keeping the pair in lockstep.
#[derive(Debug, Clone, Default)]
pub struct ResonatorStereo<R: Resonator> {
    resonators: [R; 2],
}

impl<R: Resonator> ResonatorStereo<R> {
    pub fn new() -> Self {
        Self {
            resonators: [R::default(), R::default()],
        }
    }

    pub fn reset(&mut self) {
        for reso in &mut self.resonators {
            reso.reset();
        }
    }

    pub fn reset_channel(&mut self, ch: usize) {
        self.resonators[ch].reset();
    }

    pub fn set_cutoff_fc(&mut self, fc: f64, ch: usize) {
        self.resonators[ch].set_cutoff_fc(fc);
    }

    pub fn set_bandwidth(&mut self, bw: f64, ch: usize) {
        self.resonators[ch].set_bandwidth(bw);
    }

    pub fn update_channel(&mut self, ch: usize) {
        self.resonators[ch].update();
    }

    pub fn update(&mut self) {
        let [left, right] = &mut self.resonators;
        left.update();
        right.copy_from(left);
    }

    #[inline]
    pub fn process_sample(&mut self, x: f64, ch: usize) -> f64 {
        self.resonators[ch].process_sample(x)
    }

    pub fn channel(&self, ch: usize) -> &R {
        &self.resonators[ch]
    }
}
