//! Rate chart with mean and sigma bands, plus the time-range selector bar.

use chrono::NaiveDate;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::theme::Theme;
use crate::alerts::RateSummary;

/// Selectable chart ranges, in days
pub const RANGES: [usize; 4] = [30, 90, 180, 365];

/// Line chart of one currency pair over the selected range
pub struct RateChart<'a> {
    series: &'a [(NaiveDate, f64)],
    summary: Option<&'a RateSummary>,
    title: &'a str,
    theme: &'a Theme,
}

impl<'a> RateChart<'a> {
    pub fn new(
        series: &'a [(NaiveDate, f64)],
        summary: Option<&'a RateSummary>,
        title: &'a str,
        theme: &'a Theme,
    ) -> Self {
        RateChart {
            series,
            summary,
            title,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(&(first_date, _)) = self.series.first() else {
            self.render_empty(frame, area);
            return;
        };

        let points = to_points(self.series, first_date);
        let x_min = 0.0;
        let mut x_max = points.last().map(|(x, _)| *x).unwrap_or(0.0);
        if x_max <= x_min {
            x_max = x_min + 1.0;
        }

        // Horizontal reference lines: (label, level, color)
        let mut bands: Vec<(&str, f64, ratatui::style::Color)> = Vec::new();
        if let Some(s) = self.summary.filter(|s| s.stdev > 0.0) {
            bands.push(("mean", s.mean, self.theme.mean_line));
            bands.push(("+1σ", s.mean + s.stdev, self.theme.one_sigma_band));
            bands.push(("-1σ", s.mean - s.stdev, self.theme.one_sigma_band));
            bands.push(("+2σ", s.mean + 2.0 * s.stdev, self.theme.two_sigma_band));
            bands.push(("-2σ", s.mean - 2.0 * s.stdev, self.theme.two_sigma_band));
        }
        let band_points: Vec<[(f64, f64); 2]> = bands
            .iter()
            .map(|(_, y, _)| [(x_min, *y), (x_max, *y)])
            .collect();

        let (mut y_min, mut y_max) = y_bounds(&points, bands.iter().map(|(_, y, _)| *y));
        if y_min >= y_max {
            y_max = y_min + 1.0;
        }
        // Add some padding to y-axis
        let y_range = y_max - y_min;
        y_min -= y_range * 0.05;
        y_max += y_range * 0.05;

        let mut datasets: Vec<Dataset> = bands
            .iter()
            .zip(band_points.iter())
            .map(|((label, _, color), pts)| {
                Dataset::default()
                    .name(label.to_string())
                    .marker(Marker::Dot)
                    .graph_type(GraphType::Line)
                    .style(Style::default().fg(*color).add_modifier(Modifier::DIM))
                    .data(pts)
            })
            .collect();
        // Rate line last so it draws over the bands
        datasets.push(
            Dataset::default()
                .name(self.title.to_string())
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(self.theme.rate_line))
                .data(&points),
        );

        let last_date = self.series[self.series.len() - 1].0;
        let mid_date = first_date + chrono::Duration::days((x_max / 2.0) as i64);
        let x_labels = vec![
            Span::raw(first_date.format("%Y-%m-%d").to_string()),
            Span::raw(mid_date.format("%Y-%m-%d").to_string()),
            Span::raw(last_date.format("%Y-%m-%d").to_string()),
        ];

        let y_labels = vec![
            Span::raw(format_value(y_min)),
            Span::raw(format_value((y_min + y_max) / 2.0)),
            Span::raw(format_value(y_max)),
        ];

        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .title(format!(" {} ", self.title))
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.title_style()),
            )
            .x_axis(
                Axis::default()
                    .title(Span::styled("date", Style::default().add_modifier(Modifier::DIM)))
                    .style(self.theme.normal_style())
                    .bounds([x_min, x_max])
                    .labels(x_labels),
            )
            .y_axis(
                Axis::default()
                    .style(self.theme.normal_style())
                    .bounds([y_min, y_max])
                    .labels(y_labels),
            );

        frame.render_widget(chart, area);
    }

    fn render_empty(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(self.theme.border_style())
            .title_style(self.theme.title_style());

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let message = Paragraph::new("No rate history for this pair")
            .style(Style::default().add_modifier(Modifier::DIM))
            .alignment(Alignment::Center);

        frame.render_widget(message, inner);
    }
}

/// Map dated rates onto (days since first date, rate)
fn to_points(series: &[(NaiveDate, f64)], first_date: NaiveDate) -> Vec<(f64, f64)> {
    series
        .iter()
        .map(|(date, rate)| ((*date - first_date).num_days() as f64, *rate))
        .collect()
}

/// Smallest and largest y over the rate points and any reference lines
fn y_bounds(points: &[(f64, f64)], extra: impl Iterator<Item = f64>) -> (f64, f64) {
    points
        .iter()
        .map(|(_, y)| *y)
        .chain(extra)
        .fold((f64::MAX, f64::MIN), |(lo, hi), y| (lo.min(y), hi.max(y)))
}

/// Range selector bar widget
pub struct RangeSelector<'a> {
    selected: usize,
    theme: &'a Theme,
}

impl<'a> RangeSelector<'a> {
    pub fn new(selected: usize, theme: &'a Theme) -> Self {
        RangeSelector { selected, theme }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let spans: Vec<Span> = RANGES
            .iter()
            .enumerate()
            .flat_map(|(i, days)| {
                let num = format!("[{}] ", i + 1);
                let style = if i == self.selected {
                    self.theme.highlight_style()
                } else {
                    self.theme.normal_style()
                };
                vec![
                    Span::styled(num, Style::default().add_modifier(Modifier::DIM)),
                    Span::styled(format!("{days}d  "), style),
                ]
            })
            .collect();

        let paragraph = Paragraph::new(Line::from(spans)).style(self.theme.normal_style());

        frame.render_widget(paragraph, area);
    }
}

/// Format a value for display on axis labels
pub fn format_value(value: f64) -> String {
    if value.abs() >= 1000.0 {
        format!("{:.1}", value)
    } else if value.abs() >= 100.0 {
        format!("{:.2}", value)
    } else {
        format!("{:.4}", value)
    }
}
