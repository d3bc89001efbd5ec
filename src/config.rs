#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, MAX_BANDS};

pub const DEFAULT_NUM_BANDS: usize = 8;
/// E2, about 82 Hz.
pub const DEFAULT_LOWEST_PITCH: f32 = 40.0;
/// E8, about 5.3 kHz.
pub const DEFAULT_HIGHEST_PITCH: f32 = 112.0;
pub const DEFAULT_ATTACK: f64 = 1.0;
pub const DEFAULT_DECAY: f64 = 8.0;
pub const DEFAULT_BANDWIDTH_PERCENT: f64 = 2.0;
pub const DEFAULT_THRESHOLD_DB: f32 = -12.0;
pub const DEFAULT_TILT_DB: f32 = 0.0;
pub const DEFAULT_HOLD_MS: f64 = 100.0;

/// Every user-facing detector parameter.
///
/// Each one can also be changed individually on a running detector (directly
/// or through a `DetectorMessage`); this struct is the whole-snapshot form used
/// for construction and persistence by the host.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Active bands (default: 8, at most `MAX_BANDS`)
    pub num_bands: usize,

    /// MIDI pitch of the lowest band (default: 40.0)
    pub lowest_pitch: f32,

    /// MIDI pitch of the highest band (default: 112.0)
    pub highest_pitch: f32,

    /// Attack of the slow envelope, in oscillation periods of each band's
    /// centre frequency (default: 1.0)
    pub attack: f64,

    /// Decay of the slow envelope in periods (default: 8.0). The fast
    /// envelope decays in a quarter of that.
    pub decay: f64,

    /// Multiplier on the half-semitone neighbour width of each band
    /// (default: 2.0)
    pub bandwidth_percent: f64,

    /// Onset threshold on the aggregate strength, in dB (default: -12.0)
    pub threshold_db: f32,

    /// Gain ramp across the bands: -tilt dB at the lowest, +tilt dB at the
    /// highest (default: 0.0)
    pub tilt_db: f32,

    /// Minimum spacing between reported onsets in ms (default: 100.0)
    pub hold_ms: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            num_bands: DEFAULT_NUM_BANDS,
            lowest_pitch: DEFAULT_LOWEST_PITCH,
            highest_pitch: DEFAULT_HIGHEST_PITCH,
            attack: DEFAULT_ATTACK,
            decay: DEFAULT_DECAY,
            bandwidth_percent: DEFAULT_BANDWIDTH_PERCENT,
            threshold_db: DEFAULT_THRESHOLD_DB,
            tilt_db: DEFAULT_TILT_DB,
            hold_ms: DEFAULT_HOLD_MS,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_BANDS).contains(&self.num_bands) {
            return Err(ConfigError::BandCount(self.num_bands));
        }

        let pitches_finite = self.lowest_pitch.is_finite() && self.highest_pitch.is_finite();
        let ordered = self.lowest_pitch < self.highest_pitch;
        // a single band only needs a valid centre
        if !pitches_finite || (self.num_bands > 1 && !ordered) {
            return Err(ConfigError::PitchRange {
                lowest: self.lowest_pitch,
                highest: self.highest_pitch,
            });
        }

        non_negative("attack", self.attack)?;
        positive("decay", self.decay)?;
        positive("bandwidth_percent", self.bandwidth_percent)?;
        finite("threshold_db", self.threshold_db as f64)?;
        finite("tilt_db", self.tilt_db as f64)?;
        non_negative("hold_ms", self.hold_ms)?;
        Ok(())
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(ConfigError::OutOfRange { name, value });
    }
    Ok(())
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    non_negative(name, value)?;
    if value == 0.0 {
        return Err(ConfigError::OutOfRange { name, value });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(DetectorConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_band_counts_outside_capacity() {
        for num_bands in [0, MAX_BANDS + 1] {
            let config = DetectorConfig {
                num_bands,
                ..Default::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::BandCount(num_bands)));
        }
    }

    #[test]
    fn rejects_inverted_pitch_range() {
        let config = DetectorConfig {
            lowest_pitch: 90.0,
            highest_pitch: 40.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::PitchRange { .. })));

        let single = DetectorConfig {
            num_bands: 1,
            lowest_pitch: 60.0,
            highest_pitch: 60.0,
            ..Default::default()
        };
        assert_eq!(single.validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_times() {
        let config = DetectorConfig {
            decay: 0.0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                name: "decay",
                value: 0.0
            })
        );

        let config = DetectorConfig {
            hold_ms: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange { name: "hold_ms", .. })
        ));
    }

    #[test]
    fn error_messages_name_the_field() {
        let err = ConfigError::OutOfRange {
            name: "attack",
            value: -1.0,
        };
        assert_eq!(err.to_string(), "attack must be finite and within range, got -1");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: DetectorConfig =
            serde_json::from_str(r#"{ "num_bands": 12, "threshold_db": -9.0 }"#).unwrap();
        assert_eq!(config.num_bands, 12);
        assert_eq!(config.threshold_db, -9.0);
        assert_eq!(config.hold_ms, DEFAULT_HOLD_MS);
    }
}
