use crate::{
    config::{DEFAULT_ATTACK, DEFAULT_BANDWIDTH_PERCENT, DEFAULT_DECAY},
    dsp::{
        buffer::BlockBuffer,
        convert::{freq_hz_to_fc, freq_hz_to_samples, samples_to_ms},
        envelope::EnvelopeFollower,
        resonator::{Resonator, Resonator3},
    },
};

/*
Onset Band
==========

One frequency band of the detector: a resonator tuned to the band centre,
followed by two envelope followers watching its output.

    rectified input ──► resonator ──┬──► fast follower ──┐
                                    │                    ├──► gain · fast / (slow + ε)
                                    └──► slow follower ──┘

Follower Times
--------------

Times are given in oscillation periods of the band centre, so every band
reacts on the same musical scale regardless of its frequency:

    period_ms = 1000 / freq_hz

    fast   attack 0                  decay = decay · 0.25 · period_ms
    slow   attack = attack · period  decay = decay · period_ms

The fast follower jumps on transients and drops quickly; the slow follower
lags behind. Their ratio spikes when energy appears faster than the slow
follower can track, and sits near 1 for steady signals.

    input     ▁▁▁▁▁█████████
    fast      ▁▁▁▁▁█████████
    slow      ▁▁▁▁▁▂▄▆▇█████
    ratio     ▁▁▁▁▁█▆▄▂▂▂▂▂▂

The epsilon floor keeps the ratio finite in silence, and also means very
quiet transients never register: with default settings an impulse of 0.003
(about -50 dB) still fires, 0.001 (-60 dB) does not.
*/

/// Index of the follower in the ratio's numerator.
pub const FAST: usize = 0;
/// Index of the follower in the ratio's denominator.
pub const SLOW: usize = 1;

const FAST_ATTACK: f64 = 0.0;
const DECAY0_PERCENT: f64 = 0.25;
const EPSILON: f32 = 1e-6;

pub struct OnsetCore<R: Resonator = Resonator3> {
    reso: R,
    env_fols: [EnvelopeFollower; 2],
    buffer: BlockBuffer,
    sample_rate: f64,
    freq_hz: f64,
    bw_hz: f64,
    bw_percent: f64,
    attack: f64,
    decay: f64,
    gain: f32,
}

impl<R: Resonator> OnsetCore<R> {
    pub fn new() -> Self {
        let mut core = Self {
            reso: R::default(),
            env_fols: [EnvelopeFollower::new(), EnvelopeFollower::new()],
            buffer: BlockBuffer::new(),
            sample_rate: 1.0,
            freq_hz: 5_000.0,
            bw_hz: 5_000.0,
            bw_percent: DEFAULT_BANDWIDTH_PERCENT,
            attack: DEFAULT_ATTACK,
            decay: DEFAULT_DECAY,
            gain: 1.0,
        };
        core.prepare(1.0);
        core
    }

    /// Recompute everything derived from the sample rate and clear state.
    pub fn prepare(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        for env in &mut self.env_fols {
            env.prepare(sample_rate);
        }
        self.set_freq_hz(self.freq_hz);
        self.update_bandwidth();
        self.update_filter();
        self.reso.reset();
    }

    /// Slow follower attack, in periods of the centre frequency.
    pub fn set_attack(&mut self, periods: f64) {
        self.attack = periods.max(0.0);
        self.update_envelope_times();
    }

    /// Slow follower decay, in periods. The fast follower uses a quarter.
    pub fn set_decay(&mut self, periods: f64) {
        self.decay = periods.max(0.0);
        self.update_envelope_times();
    }

    /// Unscaled band width in Hz. Takes effect on the next `update_filter`.
    pub fn set_bandwidth(&mut self, bw_hz: f64) {
        self.bw_hz = bw_hz.max(0.0);
        self.update_bandwidth();
    }

    /// Multiplier on the width set by `set_bandwidth`. Takes effect on the
    /// next `update_filter`.
    pub fn set_bandwidth_percent(&mut self, percent: f64) {
        self.bw_percent = percent.max(0.0);
        self.update_bandwidth();
    }

    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain;
    }

    /// Retune the centre. The resonator picks it up on the next
    /// `update_filter`; follower times change immediately.
    pub fn set_freq_hz(&mut self, freq_hz: f64) {
        self.freq_hz = freq_hz.max(f64::MIN_POSITIVE);
        self.reso
            .set_cutoff_fc(freq_hz_to_fc(self.freq_hz, self.sample_rate));
        self.update_envelope_times();
    }

    /// Commit pending cutoff and bandwidth changes to the resonator.
    pub fn update_filter(&mut self) {
        self.reso.update();
    }

    /// Take over another band's tuning and follower settings.
    pub fn copy_from(&mut self, other: &Self) {
        self.reso.copy_from(&other.reso);
        self.sample_rate = other.sample_rate;
        self.freq_hz = other.freq_hz;
        self.bw_hz = other.bw_hz;
        self.bw_percent = other.bw_percent;
        self.attack = other.attack;
        self.decay = other.decay;
        self.gain = other.gain;
        self.update_envelope_times();
    }

    /// Clear filter and follower state, keeping every setting.
    pub fn reset(&mut self) {
        self.reso.reset();
        for env in &mut self.env_fols {
            env.reset(0.0);
        }
    }

    /// Load the rectified mono input for this block.
    pub fn copy_input(&mut self, input: &BlockBuffer, num_samples: usize) {
        self.buffer.copy_from(input, num_samples);
    }

    /// Run the resonator over the block in place.
    pub fn resonate(&mut self, num_samples: usize) {
        for sample in self.buffer.as_mut_slice(num_samples) {
            *sample = self.reso.process_sample(*sample as f64) as f32;
        }
    }

    /// Feed the resonated block to both followers.
    pub fn synthesize_envelope_followers(&mut self, num_samples: usize) {
        let resonated = self.buffer.as_slice(num_samples);
        for env in &mut self.env_fols {
            env.process_mono(resonated);
        }
    }

    /// Band strength at `s`, stored back into the band buffer.
    #[inline]
    pub fn process_sample(&mut self, s: usize) -> f32 {
        let fast = self.env_fols[FAST][s];
        let slow = self.env_fols[SLOW][s];
        let y = self.gain * fast / (slow + EPSILON);
        self.buffer[s] = y;
        y
    }

    /// Full per-block pipeline: input, resonate, follow, ratio.
    pub fn render(&mut self, input: &BlockBuffer, num_samples: usize) {
        self.copy_input(input, num_samples);
        self.resonate(num_samples);
        self.synthesize_envelope_followers(num_samples);
        for s in 0..num_samples {
            self.process_sample(s);
        }
    }

    /// Accumulate this band's buffer into `out`.
    pub fn add_to(&self, out: &mut BlockBuffer, num_samples: usize) {
        for (o, &x) in out
            .as_mut_slice(num_samples)
            .iter_mut()
            .zip(self.buffer.as_slice(num_samples))
        {
            *o += x;
        }
    }

    pub fn max_magnitude(&self, num_samples: usize) -> f32 {
        self.buffer.max_magnitude(num_samples)
    }

    pub fn buffer(&self) -> &BlockBuffer {
        &self.buffer
    }

    pub fn envelope(&self, index: usize) -> &EnvelopeFollower {
        &self.env_fols[index]
    }

    pub fn resonator(&self) -> &R {
        &self.reso
    }

    pub fn freq_hz(&self) -> f64 {
        self.freq_hz
    }

    /// Effective width in Hz after the percentage.
    pub fn bandwidth_hz(&self) -> f64 {
        self.bw_hz * self.bw_percent
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    pub fn attack(&self) -> f64 {
        self.attack
    }

    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Both followers asleep: the band has gone quiet.
    pub fn is_sleepy(&self) -> bool {
        self.env_fols.iter().all(EnvelopeFollower::is_sleepy)
    }

    fn period_ms(&self) -> f64 {
        samples_to_ms(
            freq_hz_to_samples(self.freq_hz, self.sample_rate),
            self.sample_rate,
        )
    }

    fn update_envelope_times(&mut self) {
        let period_ms = self.period_ms();
        let fast = &mut self.env_fols[FAST];
        fast.set_attack(FAST_ATTACK);
        fast.set_decay(self.decay * DECAY0_PERCENT * period_ms);
        let slow = &mut self.env_fols[SLOW];
        slow.set_attack(self.attack * period_ms);
        slow.set_decay(self.decay * period_ms);
    }

    fn update_bandwidth(&mut self) {
        let bw = self.bw_hz * self.bw_percent;
        self.reso.set_bandwidth(freq_hz_to_fc(bw, self.sample_rate));
    }
}

impl<R: Resonator> Default for OnsetCore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::resonator::Resonator2;
    use approx::assert_relative_eq;

    const SAMPLE_RATE: f64 = 48_000.0;

    fn band(freq_hz: f64) -> OnsetCore {
        let mut core = OnsetCore::new();
        core.prepare(SAMPLE_RATE);
        core.set_freq_hz(freq_hz);
        core.set_bandwidth(freq_hz * 0.06);
        core.update_filter();
        core
    }

    fn input(samples: &[f32]) -> BlockBuffer {
        let mut buffer = BlockBuffer::new();
        buffer.copy_from_slice(samples);
        buffer.rectify(samples.len());
        buffer
    }

    #[test]
    fn follower_times_scale_with_period() {
        let core = band(1_000.0);
        // 1 ms period
        assert_relative_eq!(core.envelope(FAST).params().attack_ms(), 0.0);
        assert_relative_eq!(core.envelope(FAST).params().decay_ms(), 2.0, epsilon = 1e-9);
        assert_relative_eq!(core.envelope(SLOW).params().attack_ms(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(core.envelope(SLOW).params().decay_ms(), 8.0, epsilon = 1e-9);

        let core = band(250.0);
        assert_relative_eq!(core.envelope(SLOW).params().decay_ms(), 32.0, epsilon = 1e-9);
    }

    #[test]
    fn silence_gives_zero_strength() {
        let mut core = band(1_000.0);
        let silence = BlockBuffer::new();
        core.render(&silence, 256);
        assert_eq!(core.max_magnitude(256), 0.0);
    }

    #[test]
    fn silent_slow_follower_divides_by_floor() {
        let mut core = band(1_000.0);
        core.set_gain(2.5);
        core.reset();
        core.env_fols[FAST].process_mono(&[0.5]);
        core.env_fols[SLOW].process_mono(&[0.0]);
        assert_eq!(core.envelope(FAST).values(1), &[0.5]);
        assert_eq!(core.envelope(SLOW).values(1), &[0.0]);

        let y = core.process_sample(0);
        assert_relative_eq!(y, 2.5 * 0.5 / 1e-6, max_relative = 1e-6);
        assert_eq!(core.buffer()[0], y);
    }

    #[test]
    fn impulse_spikes_then_settles() {
        let mut core = band(1_000.0);
        let mut block = [0.0f32; 2048];
        block[0] = 1.0;
        core.render(&input(&block), 2048);

        let out = core.buffer().as_slice(2048);
        let peak = out.iter().cloned().fold(0.0f32, f32::max);
        assert!(peak > 1.0, "peak {peak}");
        assert!(out[2047] < peak * 0.5);
        assert!(out.iter().all(|x| x.is_finite() && *x >= 0.0));
    }

    #[test]
    fn steady_tone_ratio_stays_moderate() {
        let mut core = band(1_000.0);
        let tone: Vec<f32> = (0..2048)
            .map(|n| (std::f64::consts::TAU * 1_000.0 * n as f64 / SAMPLE_RATE).sin() as f32 * 0.5)
            .collect();
        let tone = input(&tone);
        for _ in 0..8 {
            core.render(&tone, 2048);
        }
        // fast over slow hovers a little above unity once both have settled
        let steady = core.max_magnitude(2048);
        assert!(steady < 4.0, "steady ratio {steady}");
        assert!(steady > 0.5, "steady ratio {steady}");

        let mut impulse = [0.0f32; 2048];
        impulse[0] = 1.0;
        let mut fresh = band(1_000.0);
        fresh.render(&input(&impulse), 2048);
        assert!(fresh.max_magnitude(2048) > 10.0 * steady);
    }

    #[test]
    fn gain_scales_output_and_add_to_accumulates() {
        let mut a = band(500.0);
        let mut b = band(500.0);
        b.set_gain(0.5);

        let mut block = [0.0f32; 512];
        block[10] = 1.0;
        let block = input(&block);
        a.render(&block, 512);
        b.render(&block, 512);
        assert_relative_eq!(b.max_magnitude(512), a.max_magnitude(512) * 0.5, max_relative = 1e-5);

        let mut sum = BlockBuffer::new();
        a.add_to(&mut sum, 512);
        b.add_to(&mut sum, 512);
        assert_relative_eq!(sum.max_magnitude(512), a.max_magnitude(512) * 1.5, max_relative = 1e-5);
    }

    #[test]
    fn copy_from_matches_processing() {
        let source = band(2_000.0);
        let mut copy: OnsetCore = OnsetCore::new();
        copy.prepare(SAMPLE_RATE);
        copy.copy_from(&source);
        assert_eq!(copy.freq_hz(), 2_000.0);
        assert_relative_eq!(copy.bandwidth_hz(), source.bandwidth_hz());

        let mut source = source;
        let mut block = [0.0f32; 256];
        block[3] = 0.8;
        let block = input(&block);
        source.render(&block, 256);
        copy.render(&block, 256);
        assert_eq!(source.buffer().as_slice(256), copy.buffer().as_slice(256));
    }

    #[test]
    fn works_with_plain_resonator() {
        let mut core: OnsetCore<Resonator2> = OnsetCore::new();
        core.prepare(SAMPLE_RATE);
        core.set_freq_hz(3_000.0);
        core.set_bandwidth(180.0);
        core.update_filter();

        let mut block = [0.0f32; 128];
        block[0] = 1.0;
        core.render(&input(&block), 128);
        assert!(core.max_magnitude(128) > 0.0);
    }

    #[test]
    fn reset_clears_followers() {
        let mut core = band(1_000.0);
        let mut block = [0.0f32; 64];
        block[0] = 1.0;
        core.render(&input(&block), 64);
        assert!(core.envelope(SLOW).level() > 0.0);

        core.reset();
        assert_eq!(core.envelope(FAST).level(), 0.0);
        assert_eq!(core.envelope(SLOW).level(), 0.0);
        assert!(core.is_sleepy());
    }
}
