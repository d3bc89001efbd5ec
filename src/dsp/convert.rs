//! Unit conversions shared by the filters and the detector.
//!
//! Pitches are MIDI-style note numbers (A4 = 69 = 440 Hz) but fractional, so
//! band centres can sit between semitones.

/// Convert decibels to linear amplitude.
#[inline]
pub fn db_to_amp(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert linear amplitude to decibels. Zero maps to negative infinity.
#[inline]
pub fn amp_to_db(amp: f32) -> f32 {
    20.0 * amp.log10()
}

/// Convert a (fractional) MIDI pitch to frequency in Hz.
#[inline]
pub fn note_to_freq_hz(note: f32) -> f32 {
    440.0 * 2.0_f32.powf((note - 69.0) / 12.0)
}

/// Convert a frequency in Hz to a (fractional) MIDI pitch.
#[inline]
pub fn freq_hz_to_note(freq_hz: f32) -> f32 {
    69.0 + 12.0 * (freq_hz / 440.0).log2()
}

/// Length of one oscillation period in samples.
#[inline]
pub fn freq_hz_to_samples(freq_hz: f64, sample_rate: f64) -> f64 {
    sample_rate / freq_hz
}

#[inline]
pub fn samples_to_ms(samples: f64, sample_rate: f64) -> f64 {
    samples * 1000.0 / sample_rate
}

#[inline]
pub fn ms_to_samples(ms: f64, sample_rate: f64) -> f64 {
    ms * 0.001 * sample_rate
}

/// Normalized frequency, 0.5 being Nyquist.
#[inline]
pub fn freq_hz_to_fc(freq_hz: f64, sample_rate: f64) -> f64 {
    freq_hz / sample_rate
}
