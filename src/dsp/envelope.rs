use crate::dsp::{buffer::BlockBuffer, convert::db_to_amp, lowpass::Lowpass};

/*
Envelope Follower
=================

Tracks the amplitude of a signal: rectify, then smooth with a one-pole
lowpass whose time constant depends on direction.

Vocabulary
----------

  attack      How quickly the envelope rises when the input is above it.
  decay       How quickly it falls when the input is below it.
  stage       Attack or Decay. Decides which time constant the lowpass uses.

The Shape
---------

    input  ▁▁▁▁█▇▆▅▄▃▂▁▁▁▁
    env    ▁▁▁▁▄▆▇▆▅▄▃▂▂▁▁     fast rise (attack), slow fall (decay)

The State Machine
-----------------

Per sample, with s0 the current envelope and s1 the rectified input:

    Attack, s0 <= s1  → stay in Attack, smooth with the attack constant
    Attack, s0 >  s1  → switch to Decay, smooth THIS sample with decay
    Decay,  s0 >= s1  → stay in Decay, smooth with the decay constant
    Decay,  s0 <  s1  → switch to Attack, smooth THIS sample with attack

A transition takes effect on the sample that caused it, never one sample
late, and at most one switch happens per sample. Ties keep the current stage.
*/

/// Level below which a decaying follower counts as asleep (-60 dB).
const SLEEPY_DB: f32 = -60.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowerStage {
    Attack,
    Decay,
}

/// Attack/decay times and the lowpass coefficients derived from them.
#[derive(Debug, Clone, Copy)]
pub struct EnvelopeParams {
    sample_rate: f64,
    attack_ms: f64,
    decay_ms: f64,
    attack_x: f64,
    decay_x: f64,
}

impl EnvelopeParams {
    pub fn new(attack_ms: f64, decay_ms: f64) -> Self {
        let mut params = Self {
            sample_rate: 1.0,
            attack_ms,
            decay_ms,
            attack_x: 0.0,
            decay_x: 0.0,
        };
        params.prepare(1.0);
        params
    }

    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.set_attack(self.attack_ms);
        self.set_decay(self.decay_ms);
    }

    pub fn set_attack(&mut self, ms: f64) {
        self.attack_ms = ms.max(0.0);
        self.attack_x = Lowpass::x_from_ms(self.attack_ms, self.sample_rate);
    }

    pub fn set_decay(&mut self, ms: f64) {
        self.decay_ms = ms.max(0.0);
        self.decay_x = Lowpass::x_from_ms(self.decay_ms, self.sample_rate);
    }

    pub fn attack_ms(&self) -> f64 {
        self.attack_ms
    }

    pub fn decay_ms(&self) -> f64 {
        self.decay_ms
    }
}

pub struct EnvelopeFollower {
    params: EnvelopeParams,
    buffer: BlockBuffer,
    sleepy_level: f64,
    env_lp: Lowpass,
    stage: FollowerStage,
}

impl EnvelopeFollower {
    pub fn new() -> Self {
        Self::with_times(0.0, 0.0)
    }

    pub fn with_times(attack_ms: f64, decay_ms: f64) -> Self {
        let mut follower = Self {
            params: EnvelopeParams::new(attack_ms, decay_ms),
            buffer: BlockBuffer::new(),
            sleepy_level: db_to_amp(SLEEPY_DB) as f64,
            env_lp: Lowpass::new(0.0),
            stage: FollowerStage::Decay,
        };
        follower.sync_coefficient();
        follower
    }

    /// Recompute both time constants for a new sample rate and clear state.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.params.prepare(sample_rate);
        self.reset(0.0);
    }

    pub fn set_attack(&mut self, ms: f64) {
        self.params.set_attack(ms);
        self.sync_coefficient();
    }

    pub fn set_decay(&mut self, ms: f64) {
        self.params.set_decay(ms);
        self.sync_coefficient();
    }

    /// Jump the envelope to `value` and fall back to the decay stage.
    pub fn reset(&mut self, value: f64) {
        self.env_lp.reset_to(value);
        self.stage = FollowerStage::Decay;
        self.sync_coefficient();
    }

    /// Follow a planar block: mix to mono, rectify, then track.
    pub fn process(&mut self, channels: &[&[f32]], num_samples: usize) {
        self.buffer.copy_from_mid(channels, 0, num_samples);
        self.buffer.rectify(num_samples);
        self.synthesize_envelope(num_samples);
    }

    /// Follow a mono block. The input is left untouched; the envelope lands in
    /// the follower's own buffer.
    pub fn process_mono(&mut self, samples: &[f32]) {
        let num_samples = samples.len();
        for (out, &x) in self.buffer.as_mut_slice(num_samples).iter_mut().zip(samples) {
            *out = x.abs();
        }
        self.synthesize_envelope(num_samples);
    }

    fn synthesize_envelope(&mut self, num_samples: usize) {
        for s in 0..num_samples {
            let s1 = self.buffer[s] as f64;
            self.buffer[s] = self.next_sample(s1) as f32;
        }
    }

    /// Advance by one rectified input sample.
    #[inline]
    pub fn next_sample(&mut self, s1: f64) -> f64 {
        let s0 = self.env_lp.value();
        match self.stage {
            FollowerStage::Attack if s0 > s1 => {
                self.stage = FollowerStage::Decay;
                self.env_lp.set_x(self.params.decay_x);
            }
            FollowerStage::Decay if s0 < s1 => {
                self.stage = FollowerStage::Attack;
                self.env_lp.set_x(self.params.attack_x);
            }
            _ => {}
        }
        self.env_lp.process_sample(s1)
    }

    /// True when decaying below -60 dB: upstream code may skip work.
    pub fn is_sleepy(&self) -> bool {
        self.stage == FollowerStage::Decay && self.env_lp.value() < self.sleepy_level
    }

    /// Envelope values of the last processed block.
    pub fn values(&self, num_samples: usize) -> &[f32] {
        self.buffer.as_slice(num_samples)
    }

    /// Current envelope level.
    pub fn level(&self) -> f64 {
        self.env_lp.value()
    }

    pub fn stage(&self) -> FollowerStage {
        self.stage
    }

    pub fn params(&self) -> &EnvelopeParams {
        &self.params
    }

    fn sync_coefficient(&mut self) {
        let x = match self.stage {
            FollowerStage::Attack => self.params.attack_x,
            FollowerStage::Decay => self.params.decay_x,
        };
        self.env_lp.set_x(x);
    }
}

impl Default for EnvelopeFollower {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Index<usize> for EnvelopeFollower {
    type Output = f32;

    fn index(&self, i: usize) -> &f32 {
        &self.buffer[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SAMPLE_RATE: f64 = 48_000.0;

    fn follower(attack_ms: f64, decay_ms: f64) -> EnvelopeFollower {
        let mut env = EnvelopeFollower::with_times(attack_ms, decay_ms);
        env.prepare(SAMPLE_RATE);
        env
    }

    fn samples_to_reach(env: &mut EnvelopeFollower, input: f64, target: f64, rising: bool) -> usize {
        for n in 1..=100_000 {
            let y = env.next_sample(input);
            if (rising && y >= target) || (!rising && y <= target) {
                return n;
            }
        }
        panic!("envelope never reached {target}");
    }

    #[test]
    fn rise_and_fall_follow_their_own_time_constants() {
        // 1 ms attack = 48 samples, 10 ms decay = 480 samples
        let mut env = follower(1.0, 10.0);

        let rise = samples_to_reach(&mut env, 1.0, 1.0 - (-1.0f64).exp(), true);
        assert!((47..=49).contains(&rise), "rise took {rise} samples");

        // settle at the top before stepping down
        for _ in 0..2_000 {
            env.next_sample(1.0);
        }
        let fall = samples_to_reach(&mut env, 0.0, (-1.0f64).exp(), false);
        assert!((478..=482).contains(&fall), "fall took {fall} samples");
    }

    #[test]
    fn transition_applies_on_the_same_sample() {
        let mut env = follower(0.0, 10.0);
        env.next_sample(1.0);
        assert_eq!(env.stage(), FollowerStage::Attack);
        assert_eq!(env.level(), 1.0); // zero attack is instant

        // first lower sample must already use the decay constant
        let y = env.next_sample(0.0);
        let decay_x = Lowpass::x_from_ms(10.0, SAMPLE_RATE);
        assert_eq!(env.stage(), FollowerStage::Decay);
        assert_relative_eq!(y, decay_x, epsilon = 1e-12);

        // and the first higher sample the attack constant
        let y = env.next_sample(2.0);
        assert_eq!(env.stage(), FollowerStage::Attack);
        assert_eq!(y, 2.0);
    }

    #[test]
    fn equal_input_keeps_stage() {
        let mut env = follower(5.0, 5.0);
        env.reset(0.25);
        env.next_sample(0.25);
        assert_eq!(env.stage(), FollowerStage::Decay);
    }

    #[test]
    fn rectifies_and_mixes_stereo() {
        let mut env = follower(0.0, 0.0);
        let left = [-0.5f32, 0.5, -1.0];
        let right = [-0.5f32, -0.5, 0.0];
        env.process(&[&left, &right], 3);
        assert_eq!(env.values(3), &[0.5, 0.0, 0.5]);
        assert_eq!(env[2], 0.5);

        env.process_mono(&[-0.25, 0.75]);
        assert_eq!(env.values(2), &[0.25, 0.75]);
    }

    #[test]
    fn changing_times_mid_stage_takes_effect_immediately() {
        let mut env = follower(10.0, 10.0);
        env.next_sample(1.0);
        assert_eq!(env.stage(), FollowerStage::Attack);

        env.set_attack(0.0);
        assert_eq!(env.next_sample(1.0), 1.0);
    }

    #[test]
    fn goes_sleepy_after_decaying_below_floor() {
        let mut env = follower(0.0, 1.0);
        env.next_sample(1.0);
        assert!(!env.is_sleepy());

        let mut block = [0.0f32; 1024];
        block[0] = 1.0;
        env.process_mono(&block);
        assert!(env.is_sleepy());
        assert!(env.values(1024).windows(2).all(|w| w[1] <= w[0]));
    }
}
