use lowlat_lib::constants::{MAX_TARGET_BUFFER_SECS, MIN_TARGET_BUFFER_SECS};
use lowlat_lib::monitor::Severity;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, Paragraph},
    Terminal,
};

use crate::controls::StatusSnapshot;

const ORANGE: Color = Color::Rgb(255, 165, 0);

pub fn severity_color(severity: Option<Severity>) -> Color {
    match severity {
        Some(Severity::Good) => Color::Green,
        Some(Severity::Warn) => ORANGE,
        Some(Severity::Bad) => Color::Red,
        None => Color::Gray,
    }
}

/// Position of a buffer value on the control, in `0.0..=1.0`.
pub fn buffer_ratio(target_buffer_secs: f64) -> f64 {
    let span = MAX_TARGET_BUFFER_SECS - MIN_TARGET_BUFFER_SECS;
    ((target_buffer_secs - MIN_TARGET_BUFFER_SECS) / span).clamp(0.0, 1.0)
}

pub fn draw_status(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    status: &StatusSnapshot,
    target_buffer_secs: f64,
    log_lines: &[String],
) {
    let _ = terminal.draw(|f| {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(5),
                Constraint::Min(0),
            ])
            .split(f.size());

        let title = Paragraph::new("lowlat · HLS latency viewer")
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        f.render_widget(title, chunks[0]);

        let controls = Paragraph::new("s/enter=start  x=stop  ←/→ or -/= buffer ±0.1s  q=quit")
            .style(Style::default().fg(Color::Blue))
            .block(Block::default().borders(Borders::ALL).title("Controls"));
        f.render_widget(controls, chunks[1]);

        let latency = Paragraph::new(status.latency.as_str())
            .alignment(Alignment::Center)
            .style(
                Style::default()
                    .fg(severity_color(status.severity))
                    .add_modifier(Modifier::BOLD),
            )
            .block(Block::default().borders(Borders::ALL).title("Latency"));
        f.render_widget(latency, chunks[2]);

        let buffer = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Target buffer"))
            .gauge_style(Style::default().fg(Color::Magenta))
            .ratio(buffer_ratio(target_buffer_secs))
            .label(status.buffer.as_str());
        f.render_widget(buffer, chunks[3]);

        let status_widget = Paragraph::new(status.text.as_str())
            .style(Style::default().fg(Color::Green))
            .block(Block::default().borders(Borders::ALL).title("Playback"));
        f.render_widget(status_widget, chunks[4]);

        let log_height = chunks[5].height.saturating_sub(2) as usize;
        let start = log_lines.len().saturating_sub(log_height);
        let log_text = if log_lines.is_empty() {
            "No logs yet.".to_string()
        } else {
            log_lines[start..].join("\n")
        };

        let log_widget = Paragraph::new(log_text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Logs"));
        f.render_widget(log_widget, chunks[5]);
    });
}
