//! Parameter and meter panels

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use flux_suite::graph::{MeterSnapshot, SharedState, StageId, StageStatus};
use flux_suite::params::ParameterTree;

/// Parameter groups shown in each named panel.
pub fn groups_for(panel: &str) -> &'static [&'static str] {
    match panel {
        "oscillator" => &["osc"],
        "envelope" => &["env", "pitchEnv"],
        "distortion" => &["distortion"],
        "filter" => &["filter"],
        "disflux" => &["disflux"],
        "heretic" => &["heretic"],
        _ => &[],
    }
}

/// List the parameters of `groups` with their current values. The one at
/// tree index `selected` is highlighted.
pub fn render_parameters(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    tree: &ParameterTree,
    groups: &[&str],
    selected: usize,
) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let mut lines = Vec::new();

    for (index, parameter) in tree.iter().enumerate() {
        if !groups.iter().any(|group| *group == parameter.group()) {
            continue;
        }
        let is_selected = index == selected;
        let style = if is_selected {
            Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let label = if groups.len() > 1 {
            format!("{} {}", parameter.group(), parameter.name())
        } else {
            parameter.name().to_string()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{}{label:<16}", if is_selected { ">" } else { " " }), style),
            Span::styled(format!(" {}", parameter.display()), Style::default().fg(Color::Yellow)),
        ]));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn to_db(level: f32) -> f32 {
    20.0 * level.max(1e-6).log10()
}

fn status_label(status: StageStatus) -> String {
    let mut flags = Vec::new();
    if status.contains(StageStatus::CUTOFF_CLAMPED) {
        flags.push("cutoff");
    }
    if status.contains(StageStatus::RESONANCE_CLAMPED) {
        flags.push("resonance");
    }
    if status.contains(StageStatus::FEEDBACK_CLAMPED) {
        flags.push("feedback");
    }
    if flags.is_empty() {
        "ok".to_string()
    } else {
        format!("clamped: {}", flags.join(", "))
    }
}

/// Peak gauges per channel, RMS readout and stage clamp flags.
pub fn render_meters(frame: &mut Frame, area: Rect, title: &str, meters: &MeterSnapshot, shared: &SharedState) {
    let block = Block::default().title(title.to_string()).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let channels = meters.channels.max(1);
    let mut constraints = vec![Constraint::Length(1); channels];
    constraints.push(Constraint::Min(1));
    let rows = Layout::default().direction(Direction::Vertical).constraints(constraints).split(inner);

    for ch in 0..channels.min(meters.peak.len()) {
        let peak_db = to_db(meters.peak[ch]);
        // -60 dB .. 0 dB across the gauge.
        let ratio = f64::from(((peak_db + 60.0) / 60.0).clamp(0.0, 1.0));
        let color = if meters.peak[ch] >= 1.0 { Color::Red } else { Color::Green };
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(color))
            .ratio(ratio)
            .label(format!("{peak_db:>6.1} dB  rms {:>6.1}", to_db(meters.rms[ch])));
        frame.render_widget(gauge, rows[ch]);
    }

    let mut lines = vec![Line::from(Span::styled(
        format!("{:.1} kHz  blocks {}", shared.sample_rate() / 1000.0, shared.processed_blocks()),
        Style::default().fg(Color::DarkGray),
    ))];
    for stage in StageId::ALL {
        let status = shared.stage_status(stage);
        let color = if status.is_clear() { Color::DarkGray } else { Color::Yellow };
        lines.push(Line::from(Span::styled(
            format!("{stage:?}: {}", status_label(status)),
            Style::default().fg(color),
        )));
    }
    frame.render_widget(Paragraph::new(lines), rows[channels]);
}
