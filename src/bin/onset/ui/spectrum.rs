//! Input spectrum widget
//!
//! FFT of the input on log-spaced bins, with the detector's band centres
//! marked on top so it is easy to see which bands a sound excites.

use std::sync::Arc;

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};
use rustfft::{num_complex::Complex, Fft, FftPlanner};

use super::MeterUpdate;

/// Number of frequency bins to display
const SPECTRUM_BINS: usize = 64;
/// Floor of the magnitude axis
const FLOOR_DB: f64 = -100.0;

pub struct SpectrumAnalyzer {
    /// Hann window coefficients
    window: Vec<f32>,
    /// (log2 of bin frequency, FFT index) for each displayed bin
    bins: Vec<(f64, usize)>,
    fft: Arc<dyn Fft<f32>>,
    scratch: Vec<Complex<f32>>,
    /// (log2 frequency, magnitude dB)
    spectrum: Vec<(f64, f64)>,
}

impl SpectrumAnalyzer {
    pub fn new(fft_len: usize, sample_rate: f64) -> Self {
        let fft = FftPlanner::new().plan_fft_forward(fft_len);

        let window: Vec<f32> = (0..fft_len)
            .map(|i| {
                if fft_len > 1 {
                    let phase = std::f32::consts::TAU * i as f32 / (fft_len - 1) as f32;
                    0.5 * (1.0 - phase.cos())
                } else {
                    1.0
                }
            })
            .collect();

        // 20 Hz to nyquist (capped at 20 kHz), evenly spaced in octaves
        let max_freq = (sample_rate * 0.5).clamp(1.0, 20_000.0);
        let min_freq = 20.0f64.min(max_freq);
        let half = (fft_len / 2).max(1);
        let bins = (0..SPECTRUM_BINS)
            .map(|i| {
                let t = i as f64 / (SPECTRUM_BINS - 1) as f64;
                let freq = min_freq * (max_freq / min_freq).powf(t);
                let index = ((freq * fft_len as f64 / sample_rate).round() as usize).min(half - 1);
                (freq.log2(), index)
            })
            .collect::<Vec<_>>();

        let spectrum = bins.iter().map(|&(x, _)| (x, FLOOR_DB)).collect();

        Self {
            window,
            bins,
            fft,
            scratch: vec![Complex::new(0.0, 0.0); fft_len],
            spectrum,
        }
    }

    /// Recompute from the latest input; ignores buffers of the wrong length.
    pub fn update(&mut self, buffer: &[f32]) {
        if buffer.len() != self.window.len() {
            return;
        }

        for ((bin, &sample), &w) in self.scratch.iter_mut().zip(buffer).zip(&self.window) {
            *bin = Complex::new(sample * w, 0.0);
        }
        self.fft.process(&mut self.scratch);

        for (point, &(_, index)) in self.spectrum.iter_mut().zip(&self.bins) {
            let power = self.scratch[index].norm_sqr().max(1e-12);
            point.1 = (10.0 * (power as f64).log10()).max(FLOOR_DB);
        }
    }

    pub fn data(&self) -> &[(f64, f64)] {
        &self.spectrum
    }
}

/// Render the spectrum with a marker at each active band centre
pub fn render_spectrum(frame: &mut Frame, area: Rect, spectrum: &[(f64, f64)], meter: &MeterUpdate) {
    let block = Block::default()
        .title(" Spectrum ")
        .borders(Borders::ALL);

    let x_min = spectrum.first().map_or(0.0, |p| p.0);
    let x_max = spectrum.last().map_or(1.0, |p| p.0).max(x_min + 1.0);
    let y_max = spectrum
        .iter()
        .map(|(_, db)| *db)
        .fold(FLOOR_DB, f64::max)
        .max(0.0)
        + 10.0;

    let markers: Vec<(f64, f64)> = meter
        .bands()
        .filter(|(freq, _)| *freq > 0.0)
        .map(|(freq, _)| ((freq as f64).log2(), y_max - 5.0))
        .collect();

    let datasets = vec![
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(spectrum),
        Dataset::default()
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Scatter)
            .style(Style::default().fg(Color::Yellow))
            .data(&markers),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .labels(vec!["20", "200", "2k", "20k"])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([FLOOR_DB, y_max])
                .labels(vec!["-100", "-50", "0"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
