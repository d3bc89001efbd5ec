//! TUI module for onset
//!
//! Shows the detector's aggregate strength against the threshold, per-band
//! levels, and the raw input with onsets marked, and sends parameter changes to the audio thread.

mod meter;
pub mod state;
mod spectrum;
mod status;

use std::time::Duration;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};

use onset_dsp::{DetectorConfig, DetectorMessage, MAX_BANDS};

pub use state::{InputFrame, MeterUpdate, StreamInfo};

use meter::{render_bands, render_input, render_strength};
use spectrum::{render_spectrum, SpectrumAnalyzer};
use status::{render_status, AudioStats};

/// Audio visualization buffer size (also the FFT size)
pub const VIS_BUFFER_SIZE: usize = 1024;
/// Strength readings kept for the history chart
const HISTORY_LEN: usize = 200;
/// UI frames the onset indicator stays lit
const ONSET_FLASH_FRAMES: usize = 8;

/// UI application state
pub struct UiApp {
    info: StreamInfo,
    /// Mirror of the detector's parameters, updated as messages are sent
    config: DetectorConfig,
    control_tx: Producer<DetectorMessage>,
    meter_rx: Consumer<MeterUpdate>,
    audio_rx: Consumer<InputFrame>,
    /// Latest meter reading
    meter: MeterUpdate,
    /// (index, strength) pairs for the history chart
    history: Vec<(f64, f64)>,
    /// Running index for the next history point
    history_pos: u64,
    onset_count: u64,
    frames_since_onset: usize,
    audio_buffer: Vec<f32>,
    /// Onset positions within `audio_buffer`
    onset_marks: Vec<usize>,
    spectrum: SpectrumAnalyzer,
    should_quit: bool,
}

impl UiApp {
    pub fn new(
        info: StreamInfo,
        config: DetectorConfig,
        control_tx: Producer<DetectorMessage>,
        meter_rx: Consumer<MeterUpdate>,
        audio_rx: Consumer<InputFrame>,
    ) -> Self {
        let spectrum = SpectrumAnalyzer::new(VIS_BUFFER_SIZE, info.sample_rate);
        Self {
            info,
            config,
            control_tx,
            meter_rx,
            audio_rx,
            meter: MeterUpdate::new(),
            history: Vec::with_capacity(HISTORY_LEN + 1),
            history_pos: 0,
            onset_count: 0,
            frames_since_onset: usize::MAX,
            audio_buffer: vec![0.0; VIS_BUFFER_SIZE],
            onset_marks: Vec::new(),
            spectrum,
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_audio();
            self.poll_meters();
            self.spectrum.update(&self.audio_buffer);

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    /// Keep the last VIS_BUFFER_SIZE input samples and the onsets among them
    fn poll_audio(&mut self) {
        let mut received = false;
        while let Ok(input) = self.audio_rx.pop() {
            if input.onset {
                self.onset_marks.push(self.audio_buffer.len());
            }
            self.audio_buffer.push(input.mid);
            received = true;
        }
        if received && self.audio_buffer.len() > VIS_BUFFER_SIZE {
            let excess = self.audio_buffer.len() - VIS_BUFFER_SIZE;
            self.audio_buffer.drain(0..excess);
            self.onset_marks.retain_mut(|pos| match pos.checked_sub(excess) {
                Some(shifted) => {
                    *pos = shifted;
                    true
                }
                None => false,
            });
        }
    }

    /// Fold every pending reading into the history; the newest one drives
    /// the band meters.
    fn poll_meters(&mut self) {
        self.frames_since_onset = self.frames_since_onset.saturating_add(1);
        while let Ok(update) = self.meter_rx.pop() {
            if update.onset {
                self.onset_count += 1;
                self.frames_since_onset = 0;
            }
            self.history
                .push((self.history_pos as f64, update.strength_peak as f64));
            self.history_pos += 1;
            self.meter = update;
        }
        if self.history.len() > HISTORY_LEN {
            let excess = self.history.len() - HISTORY_LEN;
            self.history.drain(0..excess);
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let msg = match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
                return;
            }
            KeyCode::Up => {
                self.config.threshold_db += 1.0;
                DetectorMessage::SetThresholdDb(self.config.threshold_db)
            }
            KeyCode::Down => {
                self.config.threshold_db -= 1.0;
                DetectorMessage::SetThresholdDb(self.config.threshold_db)
            }
            KeyCode::Right => {
                self.config.hold_ms += 10.0;
                DetectorMessage::SetHoldMs(self.config.hold_ms)
            }
            KeyCode::Left => {
                self.config.hold_ms = (self.config.hold_ms - 10.0).max(0.0);
                DetectorMessage::SetHoldMs(self.config.hold_ms)
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.config.num_bands = (self.config.num_bands + 1).min(MAX_BANDS);
                DetectorMessage::SetNumBands(self.config.num_bands)
            }
            KeyCode::Char('-') => {
                self.config.num_bands = self.config.num_bands.saturating_sub(1).max(1);
                DetectorMessage::SetNumBands(self.config.num_bands)
            }
            KeyCode::Char('t') => {
                self.config.tilt_db -= 1.0;
                DetectorMessage::SetTiltDb(self.config.tilt_db)
            }
            KeyCode::Char('T') => {
                self.config.tilt_db += 1.0;
                DetectorMessage::SetTiltDb(self.config.tilt_db)
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.onset_count = 0;
                self.history.clear();
                self.onset_marks.clear();
                DetectorMessage::Reset
            }
            _ => return,
        };
        // the audio thread drains this every callback; a full queue only
        // happens if the stream has stalled
        let _ = self.control_tx.push(msg);
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),  // Status bar
                Constraint::Min(8),     // Strength history
                Constraint::Length(9),  // Band meters
                Constraint::Length(10), // Input + spectrum
                Constraint::Length(1),  // Help bar
            ])
            .split(area);

        let stats = AudioStats::from_buffer(&self.audio_buffer);
        render_status(
            frame,
            chunks[0],
            &self.info,
            &self.config,
            self.onset_count,
            self.frames_since_onset < ONSET_FLASH_FRAMES,
            &stats,
        );

        render_strength(frame, chunks[1], &self.history, self.meter.threshold as f64);
        render_bands(frame, chunks[2], &self.meter);

        let bottom = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[3]);
        render_input(frame, bottom[0], &self.audio_buffer, &self.onset_marks);
        render_spectrum(frame, bottom[1], self.spectrum.data(), &self.meter);

        let help = Paragraph::new(
            " [Q] Quit  [↑/↓] Threshold  [←/→] Hold  [+/-] Bands  [t/T] Tilt  [R] Reset",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rtrb::RingBuffer;

    fn app() -> (UiApp, Producer<InputFrame>) {
        let info = StreamInfo {
            device_name: "test".into(),
            sample_rate: 48_000.0,
            channels: 1,
        };
        let (control_tx, _control_rx) = RingBuffer::new(4);
        let (_meter_tx, meter_rx) = RingBuffer::new(4);
        let (audio_tx, audio_rx) = RingBuffer::new(VIS_BUFFER_SIZE * 4);
        let app = UiApp::new(info, DetectorConfig::default(), control_tx, meter_rx, audio_rx);
        (app, audio_tx)
    }

    fn send(audio_tx: &mut Producer<InputFrame>, len: usize, onset_at: Option<usize>) {
        for i in 0..len {
            let input = InputFrame { mid: 0.0, onset: onset_at == Some(i) };
            audio_tx.push(input).unwrap();
        }
    }

    #[test]
    fn onset_marks_follow_the_trace_and_fall_off() {
        let (mut app, mut audio_tx) = app();

        send(&mut audio_tx, 100, Some(40));
        app.poll_audio();
        assert_eq!(app.audio_buffer.len(), VIS_BUFFER_SIZE);
        assert_eq!(app.onset_marks, vec![VIS_BUFFER_SIZE - 60]);

        send(&mut audio_tx, 200, Some(10));
        app.poll_audio();
        assert_eq!(app.onset_marks, vec![VIS_BUFFER_SIZE - 260, VIS_BUFFER_SIZE - 190]);

        send(&mut audio_tx, VIS_BUFFER_SIZE, None);
        app.poll_audio();
        assert!(app.onset_marks.is_empty());
    }
}
