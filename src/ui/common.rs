//! Common UI components: header line, status bar, and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::App;
use crate::data::Metric;

/// Render the header bar with pipeline state and ingestion counters.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let state = app.pipeline_state();
    let faulted = app.fault().is_some();
    let stats = app.stats();

    let mut spans = vec![
        Span::styled(" ● ", app.theme.state_style(state, faulted)),
        Span::styled("AIRWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(state.label(), app.theme.state_style(state, faulted)),
        Span::raw(" │ "),
        Span::raw(format!("{} samples", format_count(stats.samples()))),
        Span::raw(" │ "),
        Span::raw(format!("{} lines", format_count(stats.lines_accepted()))),
    ];

    if stats.lines_skipped() > 0 {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            format!("{} skipped", format_count(stats.lines_skipped())),
            Style::default().fg(app.theme.warning),
        ));
    }

    if app.paused {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled(
            "PAUSED",
            Style::default().fg(app.theme.warning).add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the status bar with key hints, source, and transient messages.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    // Faults and fresh status messages take precedence over the hints.
    let line = if let Some(fault) = app.fault() {
        Line::from(vec![
            Span::styled(
                " FAULT ",
                Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
            ),
            Span::raw(fault),
        ])
    } else if let Some(message) = app.get_status_message() {
        Line::from(vec![
            Span::styled(" ✓ ", Style::default().fg(app.theme.healthy)),
            Span::raw(message.to_string()),
        ])
    } else {
        Line::from(vec![
            Span::styled(
                " q",
                Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD),
            ),
            Span::raw(":quit "),
            Span::styled(
                "?",
                Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD),
            ),
            Span::raw(":help "),
            Span::styled(
                "p",
                Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD),
            ),
            Span::raw(":pause "),
            Span::styled(
                "e",
                Style::default().fg(app.theme.highlight).add_modifier(Modifier::BOLD),
            ),
            Span::raw(":export │ "),
            Span::styled(
                app.source_description().to_string(),
                Style::default().fg(app.theme.muted),
            ),
        ])
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the help overlay.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from("  q / Esc      quit"),
        Line::from("  ↑/↓ j/k Tab  select metric panel"),
        Line::from("  1-4          select panel directly"),
        Line::from("  p / Space    pause or resume the display"),
        Line::from("  r            refresh now (skip the tick)"),
        Line::from("  e            export snapshot to JSON"),
        Line::from("  ?            toggle this help"),
        Line::from(""),
        Line::from(Span::styled(
            "  Ingestion keeps running while paused.",
            Style::default().fg(app.theme.muted),
        )),
    ];

    let width = 46.min(area.width);
    let height = (lines.len() as u16 + 2).min(area.height);
    let popup = Rect::new(
        area.x + (area.width.saturating_sub(width)) / 2,
        area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        ),
        popup,
    );
}

/// Format a count for display (e.g., 1234 -> "1.2K", 1234567 -> "1.2M").
pub fn format_count(n: u64) -> String {
    if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        n.to_string()
    }
}

/// Format a sample value with a precision that suits its magnitude.
pub fn format_value(metric: Metric, value: f64) -> String {
    if !value.is_finite() {
        return format!("{value}");
    }
    match metric {
        Metric::Co2 => format!("{value:.0}"),
        _ => format!("{value:.1}"),
    }
}
