use crate::{
    config::DetectorConfig,
    dsp::{
        buffer::BlockBuffer,
        convert::{db_to_amp, note_to_freq_hz},
        resonator::{Resonator, Resonator3},
    },
    error::ConfigError,
    onset::{core::OnsetCore, hold::OnsetStrongHold},
    MAX_BANDS, MAX_BLOCK_SIZE,
};

/*
Onset Detector
==============

A bank of resonator bands spread over a pitch range, each reporting how fast
its energy is rising relative to its recent average. Their combined strength
is compared against a threshold; the first crossing after a quiet spell is an
onset.

Per Block
---------

    input ──► mono mix ──► rectify ──┬──► band 0 ──┐
                                     ├──► band 1 ──┤
                                     │    ...      ├──► strength ──► threshold ──► onset
                                     └──► band n ──┘      │              │
                                                          │         hold gate
                                                          ▼
                                              sqrt( Σ band / n )

Band Layout
-----------

Band i of n sits at pitch lo + i/(n-1) · (hi - lo), so the first and last
bands land exactly on the range ends. A single band sits in the middle.
Each band's width is the distance between the pitches half a semitone
either side of its centre, times the bandwidth percentage.

Gains carry a tilt ramp, -tilt dB at the lowest band to +tilt dB at the
highest, and a 1/n² compensation so the aggregate stays in the same range
for any band count.

    strength = sqrt( Σ gain_i · fast_i / (slow_i + ε) / n )

Scaling behaviour worth knowing when picking a threshold:

  - for a fixed signal, strength falls roughly as 1/n as bands are added
  - multiplying every gain by k multiplies strength by sqrt(k)

Hold Gate
---------

Every above-threshold sample restarts the hold timer, whether or not it
produced an onset. A sustained or rapidly repeating transient therefore
keeps the gate closed until it has been below threshold for the whole hold
length. Only the first qualifying sample of a block is reported.

    strength   ▁▁█▆▂▁▁▁█▁▁▁▁▁▁▁▁▁▁█▁▁
    threshold  ─────────────────────
    onset        ▲                 ▲      second spike lands inside the hold
    hold         ├──────────┤
                        ├──────────┤      and restarts it
*/

/// Real-time onset detector.
///
/// Call [`prepare`](Self::prepare) with the stream's sample rate, then feed
/// blocks through [`process`](Self::process) or
/// [`process_interleaved`](Self::process_interleaved). Processing never
/// allocates; every buffer is sized at construction.
pub struct OnsetDetector<R: Resonator = Resonator3> {
    buffer: BlockBuffer,
    strength: BlockBuffer,
    bands: Box<[OnsetCore<R>]>,
    strong_hold: OnsetStrongHold,
    sample_rate: f64,
    num_bands: usize,
    lowest_pitch: f32,
    highest_pitch: f32,
    attack: f64,
    decay: f64,
    bandwidth_percent: f64,
    threshold_db: f32,
    threshold: f32,
    tilt_db: f32,
    num_samples: usize,
    onset: Option<usize>,
}

impl OnsetDetector {
    /// Default settings and bands, prepared for `sample_rate`. Needs no type
    /// annotation, unlike the constructors generic over the resonator.
    pub fn with_defaults(sample_rate: f64) -> Result<Self, ConfigError> {
        Self::with_config(&DetectorConfig::default(), sample_rate)
    }
}

impl<R: Resonator> OnsetDetector<R> {
    /// Detector with default settings at a placeholder sample rate of 1 Hz.
    /// Call `prepare` before feeding real audio.
    pub fn new() -> Self {
        let config = DetectorConfig::default();
        let mut detector = Self {
            buffer: BlockBuffer::new(),
            strength: BlockBuffer::new(),
            bands: (0..MAX_BANDS).map(|_| OnsetCore::new()).collect(),
            strong_hold: OnsetStrongHold::new(),
            sample_rate: 1.0,
            num_bands: config.num_bands,
            lowest_pitch: config.lowest_pitch,
            highest_pitch: config.highest_pitch,
            attack: config.attack,
            decay: config.decay,
            bandwidth_percent: config.bandwidth_percent,
            threshold_db: config.threshold_db,
            threshold: db_to_amp(config.threshold_db),
            tilt_db: config.tilt_db,
            num_samples: 0,
            onset: None,
        };
        detector.load(&config);
        detector
    }

    /// Validated construction, prepared for `sample_rate`.
    pub fn with_config(config: &DetectorConfig, sample_rate: f64) -> Result<Self, ConfigError> {
        config.validate()?;
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(ConfigError::SampleRate(sample_rate));
        }
        let mut detector = Self::new();
        detector.load(config);
        detector.prepare(sample_rate);
        Ok(detector)
    }

    /// Replace every parameter at once. Nothing changes if validation fails.
    /// Filter and follower state is kept.
    pub fn apply_config(&mut self, config: &DetectorConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.load(config);
        log::debug!(
            "onset config: {} bands over pitch {}..{}, threshold {} dB, hold {} ms",
            config.num_bands,
            config.lowest_pitch,
            config.highest_pitch,
            config.threshold_db,
            config.hold_ms
        );
        Ok(())
    }

    /// Snapshot of the current parameters.
    pub fn config(&self) -> DetectorConfig {
        DetectorConfig {
            num_bands: self.num_bands,
            lowest_pitch: self.lowest_pitch,
            highest_pitch: self.highest_pitch,
            attack: self.attack,
            decay: self.decay,
            bandwidth_percent: self.bandwidth_percent,
            threshold_db: self.threshold_db,
            tilt_db: self.tilt_db,
            hold_ms: self.strong_hold.length_ms(),
        }
    }

    /// Recompute everything for a new sample rate and clear all state. The
    /// hold gate starts closed.
    pub fn prepare(&mut self, sample_rate: f64) {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            log::warn!("ignoring invalid sample rate {sample_rate}");
            return;
        }
        self.sample_rate = sample_rate;
        for band in self.bands.iter_mut() {
            band.prepare(sample_rate);
        }
        self.update_pitch_range();
        self.strong_hold.prepare(sample_rate);
        self.onset = None;
        self.num_samples = 0;

        let nyquist = sample_rate * 0.5;
        if let Some(top) = self.band_frequencies().last() {
            if top >= nyquist {
                log::warn!("top band at {top:.1} Hz is above nyquist ({nyquist:.1} Hz)");
            }
        }
        log::debug!(
            "onset detector prepared at {sample_rate} Hz, {} bands, hold {} samples",
            self.num_bands,
            self.strong_hold.length()
        );
    }

    /// Clear filter, follower and hold state without touching parameters.
    pub fn reset(&mut self) {
        for band in self.bands.iter_mut() {
            band.reset();
        }
        self.strong_hold.reset();
        self.onset = None;
    }

    /// Slow envelope attack in periods of each band's centre.
    pub fn set_attack(&mut self, periods: f64) {
        self.attack = periods.max(0.0);
        for band in self.bands.iter_mut() {
            band.set_attack(self.attack);
        }
    }

    /// Slow envelope decay in periods; the fast envelope uses a quarter.
    pub fn set_decay(&mut self, periods: f64) {
        self.decay = periods.max(0.0);
        for band in self.bands.iter_mut() {
            band.set_decay(self.decay);
        }
    }

    pub fn set_bandwidth_percent(&mut self, percent: f64) {
        self.bandwidth_percent = percent.max(0.0);
        for band in self.bands.iter_mut() {
            band.set_bandwidth_percent(self.bandwidth_percent);
            band.update_filter();
        }
    }

    pub fn set_threshold_db(&mut self, db: f32) {
        if db.is_nan() {
            return;
        }
        self.threshold_db = db;
        self.threshold = db_to_amp(db);
    }

    pub fn set_tilt_db(&mut self, db: f32) {
        if !db.is_finite() {
            return;
        }
        self.tilt_db = db;
        self.update_tilt();
    }

    /// Minimum spacing between onsets. Closes the gate.
    pub fn set_hold_ms(&mut self, ms: f64) {
        if ms.is_nan() {
            return;
        }
        self.strong_hold.set_length(ms);
    }

    /// Active band count, clamped to 1..=MAX_BANDS. Bands brought into use
    /// start from silence.
    pub fn set_num_bands(&mut self, num_bands: usize) {
        let num_bands = num_bands.clamp(1, MAX_BANDS);
        if num_bands > self.num_bands {
            for band in &mut self.bands[self.num_bands..num_bands] {
                band.reset();
            }
        }
        self.num_bands = num_bands;
        self.update_pitch_range();
    }

    pub fn set_lowest_pitch(&mut self, pitch: f32) {
        if pitch.is_finite() {
            self.lowest_pitch = pitch;
            self.update_pitch_range();
        }
    }

    pub fn set_highest_pitch(&mut self, pitch: f32) {
        if pitch.is_finite() {
            self.highest_pitch = pitch;
            self.update_pitch_range();
        }
    }

    /// Detect onsets in a planar block.
    ///
    /// One channel is used as-is; with two or more the first two are averaged.
    /// Blocks longer than `MAX_BLOCK_SIZE` are split internally and the
    /// returned index is relative to the start of `channels`. Returns the first
    /// onset sample, if any.
    pub fn process(&mut self, channels: &[&[f32]]) -> Option<usize> {
        let num_samples = channels
            .iter()
            .take(2)
            .map(|channel| channel.len())
            .min()
            .unwrap_or(0);
        self.process_blocks(num_samples, |buffer, offset, len| {
            buffer.copy_from_mid(channels, offset, len)
        })
    }

    /// Interleaved counterpart of [`process`](Self::process).
    pub fn process_interleaved(&mut self, data: &[f32], num_channels: usize) -> Option<usize> {
        let num_frames = data.len().checked_div(num_channels).unwrap_or(0);
        self.process_blocks(num_frames, |buffer, offset, len| {
            buffer.copy_from_interleaved(data, num_channels, offset, len)
        })
    }

    fn process_blocks(
        &mut self,
        num_samples: usize,
        mut fill: impl FnMut(&mut BlockBuffer, usize, usize),
    ) -> Option<usize> {
        if num_samples == 0 {
            self.num_samples = 0;
        }
        let mut first = None;
        let mut offset = 0;
        while offset < num_samples {
            let len = (num_samples - offset).min(MAX_BLOCK_SIZE);
            fill(&mut self.buffer, offset, len);
            if let Some(s) = self.detect(len) {
                first.get_or_insert(offset + s);
            }
            offset += len;
        }
        self.onset = first;
        first
    }

    fn detect(&mut self, num_samples: usize) -> Option<usize> {
        self.num_samples = num_samples;
        self.strong_hold.advance(num_samples);
        self.buffer.rectify(num_samples);

        let n = self.num_bands;
        for band in self.bands[..n].iter_mut() {
            band.copy_input(&self.buffer, num_samples);
            band.resonate(num_samples);
            band.synthesize_envelope_followers(num_samples);
        }

        let norm = 1.0 / n as f32;
        let mut onset = None;
        for s in 0..num_samples {
            let sum: f32 = self.bands[..n]
                .iter_mut()
                .map(|band| band.process_sample(s))
                .sum();
            let strength = (sum * norm).sqrt();
            self.strength[s] = strength;

            if strength > self.threshold {
                if onset.is_none() && self.strong_hold.is_open() {
                    onset = Some(s);
                }
                self.strong_hold.reset();
            }
        }
        onset
    }

    /// First onset of the last `process` call.
    pub fn onset(&self) -> Option<usize> {
        self.onset
    }

    /// Per-sample strength of the last processed sub-block.
    pub fn strength(&self) -> &[f32] {
        self.strength.as_slice(self.num_samples)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Active bands.
    pub fn bands(&self) -> &[OnsetCore<R>] {
        &self.bands[..self.num_bands]
    }

    pub fn band(&self, index: usize) -> Option<&OnsetCore<R>> {
        self.bands().get(index)
    }

    pub fn band_frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        self.bands().iter().map(OnsetCore::freq_hz)
    }

    /// Peak band strength over the last sub-block, per active band.
    pub fn band_levels(&self) -> impl Iterator<Item = f32> + '_ {
        let num_samples = self.num_samples;
        self.bands()
            .iter()
            .map(move |band| band.max_magnitude(num_samples))
    }

    pub fn strong_hold(&self) -> &OnsetStrongHold {
        &self.strong_hold
    }

    fn load(&mut self, config: &DetectorConfig) {
        self.lowest_pitch = config.lowest_pitch;
        self.highest_pitch = config.highest_pitch;
        self.tilt_db = config.tilt_db;
        self.set_attack(config.attack);
        self.set_decay(config.decay);
        self.set_threshold_db(config.threshold_db);
        self.set_hold_ms(config.hold_ms);
        self.bandwidth_percent = config.bandwidth_percent.max(0.0);
        for band in self.bands.iter_mut() {
            band.set_bandwidth_percent(self.bandwidth_percent);
        }
        // retunes and commits every active band
        self.set_num_bands(config.num_bands);
    }

    /// Retune the active bands and recompute their gains.
    fn update_pitch_range(&mut self) {
        let (lo, hi) = if self.lowest_pitch <= self.highest_pitch {
            (self.lowest_pitch, self.highest_pitch)
        } else {
            (self.highest_pitch, self.lowest_pitch)
        };
        let n = self.num_bands;
        for (i, band) in self.bands[..n].iter_mut().enumerate() {
            let pitch = lo + band_position(i, n) * (hi - lo);
            let freq_hz = note_to_freq_hz(pitch) as f64;
            let bw_hz = note_to_freq_hz(pitch + 0.5) as f64 - note_to_freq_hz(pitch - 0.5) as f64;
            band.set_freq_hz(freq_hz);
            band.set_bandwidth(bw_hz);
            band.update_filter();
        }
        self.update_tilt();
    }

    fn update_tilt(&mut self) {
        let n = self.num_bands;
        let compensation = 1.0 / (n * n) as f32;
        for (i, band) in self.bands[..n].iter_mut().enumerate() {
            let db = -self.tilt_db + 2.0 * self.tilt_db * band_position(i, n);
            band.set_gain(db_to_amp(db) * compensation);
        }
    }
}

impl<R: Resonator> Default for OnsetDetector<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Where band `i` of `n` sits along the range, 0 to 1.
fn band_position(i: usize, n: usize) -> f32 {
    if n > 1 {
        i as f32 / (n - 1) as f32
    } else {
        0.5
    }
}
