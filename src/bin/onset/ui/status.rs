//! Status bar widget - stream info, detector settings and the onset counter

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use onset_dsp::DetectorConfig;

use super::StreamInfo;

/// Input level statistics for display
pub struct AudioStats {
    pub peak: f32,
    pub rms: f32,
}

impl AudioStats {
    pub fn from_buffer(buffer: &[f32]) -> Self {
        if buffer.is_empty() {
            return Self { peak: 0.0, rms: 0.0 };
        }
        let peak = buffer.iter().fold(0.0f32, |acc, &x| acc.max(x.abs()));
        let rms = (buffer.iter().map(|&x| x * x).sum::<f32>() / buffer.len() as f32).sqrt();
        Self { peak, rms }
    }
}

pub fn render_status(
    frame: &mut Frame,
    area: Rect,
    info: &StreamInfo,
    config: &DetectorConfig,
    onset_count: u64,
    flashing: bool,
    stats: &AudioStats,
) {
    let block = Block::default().title(" onset ").borders(Borders::ALL);

    let indicator = if flashing {
        Span::styled(
            " ● ONSET ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Red)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(" ○       ", Style::default().fg(Color::DarkGray))
    };

    let line = Line::from(vec![
        indicator,
        Span::styled(
            format!("  Onsets: {}  ", onset_count),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("Thr: {:.0} dB  Hold: {:.0} ms  ", config.threshold_db, config.hold_ms),
            Style::default().fg(Color::Cyan),
        ),
        Span::styled(
            format!("Bands: {}  Tilt: {:+.0} dB  ", config.num_bands, config.tilt_db),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!(
                "{} {:.1}kHz {}ch  ",
                info.device_name,
                info.sample_rate / 1000.0,
                info.channels
            ),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("Peak: {:.2}  RMS: {:.2}", stats.peak, stats.rms),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    let paragraph = Paragraph::new(line).block(block);
    frame.render_widget(paragraph, area);
}
