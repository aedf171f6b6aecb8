//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::data::Metric;
use crate::pipeline::PipelineState;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and the selected panel.
    pub highlight: Color,
    /// Color for the live/streaming state.
    pub healthy: Color,
    /// Color for transitional states.
    pub warning: Color,
    /// Color for faults.
    pub critical: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Color for de-emphasized text.
    pub muted: Color,
    /// Style for the header line.
    pub header: Style,
    /// Style for the selected panel border.
    pub selected: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            healthy: Color::Green,
            warning: Color::Yellow,
            critical: Color::Red,
            border: Color::Gray,
            muted: Color::DarkGray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            healthy: Color::Green,
            warning: Color::Yellow,
            critical: Color::Red,
            border: Color::DarkGray,
            muted: Color::Gray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        // Use terminal-light crate to detect background luminance
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Accent color for one metric's chart and title.
    pub fn metric_color(&self, metric: Metric) -> Color {
        match metric {
            Metric::Pm25 => Color::Yellow,
            Metric::Co2 => Color::Red,
            Metric::Temperature => Color::Blue,
            Metric::Humidity => Color::Green,
        }
    }

    /// Style for a pipeline state indicator.
    pub fn state_style(&self, state: PipelineState, faulted: bool) -> Style {
        if faulted {
            return Style::default().fg(self.critical).add_modifier(Modifier::BOLD);
        }
        match state {
            PipelineState::Streaming => Style::default().fg(self.healthy),
            PipelineState::Idle | PipelineState::Connecting => {
                Style::default().fg(self.warning)
            }
            PipelineState::Closing | PipelineState::Terminated => {
                Style::default().fg(self.muted)
            }
            PipelineState::Faulted => {
                Style::default().fg(self.critical).add_modifier(Modifier::BOLD)
            }
        }
    }
}
