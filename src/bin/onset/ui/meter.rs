//! Detector meters: aggregate strength history, per-band levels, and the
//! input trace with onsets marked on it

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    text::Line,
    widgets::{Axis, Bar, BarChart, BarGroup, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use super::MeterUpdate;

/// Band bars are scaled so this strength fills the chart
const BAND_FULL_SCALE: f32 = 0.25;

/// Strength per callback, with the threshold drawn across it
pub fn render_strength(frame: &mut Frame, area: Rect, history: &[(f64, f64)], threshold: f64) {
    let block = Block::default()
        .title(" Strength ")
        .borders(Borders::ALL);

    let (x_min, x_max) = match (history.first(), history.last()) {
        (Some(first), Some(last)) if last.0 > first.0 => (first.0, last.0),
        _ => (0.0, 1.0),
    };
    let threshold_line = [(x_min, threshold), (x_max, threshold)];
    let y_max = history
        .iter()
        .map(|(_, s)| *s)
        .fold(threshold * 1.5, f64::max);

    let datasets = vec![
        Dataset::default()
            .name("strength")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(history),
        Dataset::default()
            .name("threshold")
            .marker(symbols::Marker::Dot)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Red))
            .data(&threshold_line),
    ];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([x_min, x_max])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(vec!["0".to_string(), format!("{:.2}", y_max)])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}

/// One bar per active band, labelled with its centre frequency
pub fn render_bands(frame: &mut Frame, area: Rect, meter: &MeterUpdate) {
    let block = Block::default().title(" Bands ").borders(Borders::ALL);

    let bars: Vec<Bar> = meter
        .bands()
        .map(|(freq, level)| {
            let value = (level / BAND_FULL_SCALE * 100.0).clamp(0.0, 100.0) as u64;
            Bar::default()
                .value(value)
                .text_value(String::new())
                .label(Line::from(format_freq(freq)))
                .style(Style::default().fg(Color::Cyan))
        })
        .collect();

    // narrow bars once the band count grows
    let inner_width = area.width.saturating_sub(2) as usize;
    let slots = bars.len().max(1);
    let bar_width = (inner_width / slots).saturating_sub(1).clamp(1, 6) as u16;

    let chart = BarChart::default()
        .block(block)
        .bar_width(bar_width)
        .bar_gap(1)
        .max(100)
        .data(BarGroup::default().bars(&bars));

    frame.render_widget(chart, area);
}

/// Recent input, mixed to mono, with a vertical line at each detected onset.
/// `onset_marks` index into `audio_buffer`.
pub fn render_input(frame: &mut Frame, area: Rect, audio_buffer: &[f32], onset_marks: &[usize]) {
    let title = match onset_marks.len() {
        0 => " Input ".to_string(),
        n => format!(" Input | {n} onset{} ", if n == 1 { "" } else { "s" }),
    };
    let block = Block::default().title(title).borders(Borders::ALL);

    let len = audio_buffer.len().max(1) as f64;
    let trace: Vec<(f64, f64)> = audio_buffer
        .iter()
        .enumerate()
        .map(|(i, &sample)| (i as f64 / len, sample.clamp(-1.0, 1.0) as f64))
        .collect();
    let marks: Vec<[(f64, f64); 2]> = onset_marks
        .iter()
        .map(|&pos| {
            let x = pos as f64 / len;
            [(x, -1.0), (x, 1.0)]
        })
        .collect();

    let mut datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&trace)];
    datasets.extend(marks.iter().map(|mark| {
        Dataset::default()
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Yellow))
            .data(mark)
    }));

    let axis_style = Style::default().fg(Color::DarkGray);
    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(Axis::default().bounds([0.0, 1.0]).style(axis_style))
        .y_axis(Axis::default().bounds([-1.0, 1.0]).style(axis_style));

    frame.render_widget(chart, area);
}

fn format_freq(freq: f32) -> String {
    if freq >= 1000.0 {
        format!("{:.1}k", freq / 1000.0)
    } else {
        format!("{:.0}", freq)
    }
}
