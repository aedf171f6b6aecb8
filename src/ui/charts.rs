//! The four stacked metric chart panels.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::common::format_value;
use crate::app::App;
use crate::data::{Metric, MetricSeries};

/// Render one panel per metric, stacked vertically.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let panels = Layout::vertical([Constraint::Ratio(1, Metric::COUNT as u32); Metric::COUNT])
        .split(area);

    for (metric, panel) in Metric::ALL.into_iter().zip(panels.iter()) {
        render_metric_panel(frame, app, metric, *panel);
    }
}

fn render_metric_panel(frame: &mut Frame, app: &App, metric: Metric, area: Rect) {
    let series = app.snapshot.as_ref().and_then(|s| s.metric(metric));
    let color = app.theme.metric_color(metric);

    let border_style = if app.selected == metric {
        app.theme.selected
    } else {
        Style::default().fg(app.theme.border)
    };

    let title = match series {
        Some(series) => Span::styled(
            format!(
                " {} ─ {} {} ",
                metric.label(),
                format_value(metric, series.latest()),
                metric.unit()
            ),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        None => Span::styled(
            format!(" {} ", metric),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(border_style);

    let Some(series) = series else {
        frame.render_widget(
            Paragraph::new("waiting for data…")
                .style(Style::default().fg(app.theme.muted))
                .block(block),
            area,
        );
        return;
    };

    // Non-finite samples are stored in the window but cannot be plotted;
    // skip them here and derive the axis range from the finite values.
    let points: Vec<(f64, f64)> = series
        .values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite())
        .map(|(i, v)| (i as f64, *v))
        .collect();

    let Some((min, max)) = series.finite_range() else {
        frame.render_widget(
            Paragraph::new("waiting for data…")
                .style(Style::default().fg(app.theme.muted))
                .block(block),
            area,
        );
        return;
    };

    let (x_max, y_bounds) = chart_bounds(series, min, max);

    let datasets = vec![Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points)];

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels([
                    Span::styled("0", Style::default().fg(app.theme.muted)),
                    Span::styled(
                        format!("{}", series.len()),
                        Style::default().fg(app.theme.muted),
                    ),
                ]),
        )
        .y_axis(
            Axis::default()
                .bounds(y_bounds)
                .labels([
                    Span::styled(
                        format_value(metric, y_bounds[0]),
                        Style::default().fg(app.theme.muted),
                    ),
                    Span::styled(
                        format_value(metric, y_bounds[1]),
                        Style::default().fg(app.theme.muted),
                    ),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Axis bounds: x spans the sample ordinals (at least 10 wide), y pads the
/// observed range so flat lines stay visible.
fn chart_bounds(series: &MetricSeries, min: f64, max: f64) -> (f64, [f64; 2]) {
    let x_max = (series.len().max(10)) as f64;
    let y_bounds = [min * 0.9 - 1.0, max * 1.1 + 1.0];
    (x_max, y_bounds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_bounds_pad_the_range() {
        let series = MetricSeries::from_values(vec![10.0, 20.0]).unwrap();
        let (x_max, y_bounds) = chart_bounds(&series, series.min, series.max);
        assert_eq!(x_max, 10.0);
        assert_eq!(y_bounds, [8.0, 23.0]);
    }

    #[test]
    fn test_chart_bounds_x_tracks_length() {
        let series = MetricSeries::from_values((0..25).map(f64::from).collect()).unwrap();
        let (x_max, _) = chart_bounds(&series, series.min, series.max);
        assert_eq!(x_max, 25.0);
    }
}
