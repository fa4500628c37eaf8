//! Oscilloscope widget

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use flux_suite::editor::ScopeView;

const TRACE_COLORS: [Color; 2] = [Color::Cyan, Color::Magenta];

/// Render every channel of the scope as an overlaid trace.
pub fn render_scope(frame: &mut Frame, area: Rect, title: &str, scope: &ScopeView) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);

    // Thicker lines trade resolution for weight.
    let marker = match scope.thickness() {
        t if t < 1.0 => symbols::Marker::Dot,
        t if t < 3.0 => symbols::Marker::Braille,
        _ => symbols::Marker::Block,
    };

    let traces: Vec<Vec<(f64, f64)>> =
        (0..scope.channel_count()).map(|ch| scope.points(ch).collect()).collect();
    let width = traces.iter().map(Vec::len).max().unwrap_or(0).max(1) as f64;

    let datasets = traces
        .iter()
        .enumerate()
        .map(|(ch, points)| {
            Dataset::default()
                .marker(marker)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(TRACE_COLORS[ch % TRACE_COLORS.len()]))
                .data(points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(Axis::default().bounds([0.0, width]).style(Style::default().fg(Color::DarkGray)))
        .y_axis(
            Axis::default()
                .bounds([-1.0, 1.0])
                .labels(vec!["-1", "0", "1"])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
