//! Audio input setup and the detector's real-time callback

use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use rtrb::RingBuffer;

use onset_dsp::{DetectorConfig, DetectorMessage, OnsetDetector, MAX_BANDS};

use super::ui::{InputFrame, MeterUpdate, StreamInfo, UiApp, VIS_BUFFER_SIZE};

/// Capacity of the UI -> audio parameter queue
const CONTROL_QUEUE_SIZE: usize = 64;
/// Capacity of the audio -> UI meter queue
const METER_QUEUE_SIZE: usize = 256;

/// Live detector on the default input device
pub struct OnsetApp {
    config: DetectorConfig,
}

impl OnsetApp {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Open the input stream and run the TUI until the user quits
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| eyre!("no default input device available"))?;
        let stream_config = device
            .default_input_config()
            .wrap_err("failed to fetch default input config")?;

        let sample_rate = stream_config.sample_rate().0 as f64;
        let channels = stream_config.channels() as usize;
        let info = StreamInfo {
            device_name: device.name().unwrap_or_else(|_| "unknown".into()),
            sample_rate,
            channels,
        };

        let mut detector: OnsetDetector = OnsetDetector::with_config(&self.config, sample_rate)
            .wrap_err("invalid detector config")?;

        let (control_tx, mut control_rx) = RingBuffer::<DetectorMessage>::new(CONTROL_QUEUE_SIZE);
        let (mut meter_tx, meter_rx) = RingBuffer::<MeterUpdate>::new(METER_QUEUE_SIZE);
        let (mut audio_tx, audio_rx) = RingBuffer::<InputFrame>::new(VIS_BUFFER_SIZE * 8);

        let stream = device
            .build_input_stream(
                &stream_config.into(),
                move |data: &[f32], _| {
                    let onset = detector.process_interleaved_with(&mut control_rx, data, channels);

                    let mut update = MeterUpdate::new();
                    update.onset = onset.is_some();
                    update.threshold = detector.threshold();
                    update.strength_peak = detector.strength().iter().fold(0.0f32, |a, &s| a.max(s));
                    update.num_bands = detector.num_bands().min(MAX_BANDS) as u8;
                    for (slot, level) in update.band_levels.iter_mut().zip(detector.band_levels()) {
                        *slot = level;
                    }
                    for (slot, freq) in update.band_freqs.iter_mut().zip(detector.band_frequencies()) {
                        *slot = freq as f32;
                    }
                    // a full queue means the UI is behind; drop the reading
                    let _ = meter_tx.push(update);

                    for (i, frame) in data.chunks_exact(channels.max(1)).enumerate() {
                        let mid = match frame {
                            [left, right, ..] => (left + right) * 0.5,
                            [mono] => *mono,
                            [] => 0.0,
                        };
                        let input = InputFrame { mid, onset: onset == Some(i) };
                        if audio_tx.push(input).is_err() {
                            break;
                        }
                    }
                },
                |err| eprintln!("Audio error: {}", err),
                None,
            )
            .wrap_err("failed to build input stream")?;

        stream.play().wrap_err("failed to start input stream")?;

        let mut terminal = ratatui::init();
        let result = UiApp::new(info, self.config, control_tx, meter_rx, audio_rx).run(&mut terminal);
        ratatui::restore();
        result
    }
}
