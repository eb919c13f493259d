//! UI widgets for the fxwatch dashboard.

use chrono::{DateTime, Local, Utc};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::chart::format_value;
use super::theme::Theme;
use crate::alerts::{AlertLevel, Evaluation, RateSummary};
use crate::data::BASE_CURRENCY;

/// Everything the dashboard shows for one tracked currency
#[derive(Debug, Clone)]
pub struct PairRow {
    pub currency: String,
    /// Statistics over the selected chart range
    pub summary: Option<RateSummary>,
    /// Z-score over the configured alert window
    pub evaluation: Evaluation,
    pub level: Option<AlertLevel>,
}

impl PairRow {
    pub fn pair_name(&self) -> String {
        format!("{BASE_CURRENCY}/{}", self.currency)
    }
}

/// Currency pair list panel widget
pub struct PairList<'a> {
    rows: &'a [PairRow],
    selected: usize,
    theme: &'a Theme,
}

impl<'a> PairList<'a> {
    pub fn new(rows: &'a [PairRow], selected: usize, theme: &'a Theme) -> Self {
        PairList {
            rows,
            selected,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, focused: bool) {
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| {
                let level_style = self.theme.level_style(row.level);
                let header = Line::from(vec![
                    Span::styled(format!("{:<9}", row.pair_name()), level_style),
                    Span::raw(
                        row.summary
                            .as_ref()
                            .map(|s| format_value(s.current))
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                ]);

                let change = row
                    .summary
                    .as_ref()
                    .map(|s| {
                        let arrow = if s.change_pct >= 0.0 { "↑" } else { "↓" };
                        format!("{arrow} {:.2}%", s.change_pct.abs())
                    })
                    .unwrap_or_default();
                let sigma = match row.evaluation.result() {
                    Some(r) => format!("{:+.2}σ", r.deviation),
                    None => "n/a".to_string(),
                };
                let detail = Line::from(vec![
                    Span::styled(
                        format!("  {change:<10}"),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                    Span::styled(sigma, level_style),
                ]);

                ListItem::new(vec![header, detail])
            })
            .collect();

        let (border_style, title_style) = self.theme.panel_styles(focused);
        let block = Block::default()
            .title(format!(" Pairs ({}) ", self.rows.len()))
            .borders(Borders::ALL)
            .border_type(if focused {
                BorderType::Double
            } else {
                BorderType::Plain
            })
            .border_style(border_style)
            .title_style(title_style);

        let list = List::new(items)
            .block(block)
            .style(self.theme.surface_style())
            .highlight_style(self.theme.highlight_style())
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if !self.rows.is_empty() {
            state.select(Some(self.selected));
        }
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Statistics panel for the selected pair
pub struct StatsPanel<'a> {
    row: Option<&'a PairRow>,
    range_days: usize,
    window_days: usize,
    theme: &'a Theme,
}

impl<'a> StatsPanel<'a> {
    pub fn new(
        row: Option<&'a PairRow>,
        range_days: usize,
        window_days: usize,
        theme: &'a Theme,
    ) -> Self {
        StatsPanel {
            row,
            range_days,
            window_days,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();

        if let Some(row) = self.row {
            let label = |text: &str| {
                Span::styled(
                    format!("{text:<10}"),
                    Style::default().add_modifier(Modifier::DIM),
                )
            };

            lines.push(Line::from(vec![label("Pair"), Span::raw(row.pair_name())]));
            match &row.summary {
                Some(s) => {
                    for (name, value) in [
                        ("Current", s.current),
                        ("Previous", s.previous),
                        ("Mean", s.mean),
                        ("Std dev", s.stdev),
                        ("High", s.max),
                        ("Low", s.min),
                    ] {
                        lines.push(Line::from(vec![label(name), Span::raw(format_value(value))]));
                    }
                    lines.push(Line::from(vec![
                        label("Days"),
                        Span::raw(format!("{} of last {}", s.points, self.range_days)),
                    ]));
                }
                None => lines.push(Line::from("No data in range")),
            }

            let deviation = match &row.evaluation {
                Evaluation::Scored(r) => format!("{:+.2}σ ({}d)", r.deviation, self.window_days),
                Evaluation::InsufficientData { points } => {
                    format!("need 2+ days, have {points}")
                }
                Evaluation::Degenerate => "flat window".to_string(),
            };
            let status = match row.level {
                Some(level) => format!("  {} {level}", level.marker()),
                None => String::new(),
            };
            lines.push(Line::from(vec![
                label("Deviation"),
                Span::styled(deviation, self.theme.level_style(row.level)),
                Span::styled(status, self.theme.level_style(row.level)),
            ]));
        }

        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .title(" Statistics ")
                    .borders(Borders::ALL)
                    .border_style(self.theme.border_style())
                    .title_style(self.theme.title_style()),
            )
            .style(self.theme.surface_style());

        frame.render_widget(paragraph, area);
    }
}

/// Status bar widget
pub struct StatusBar<'a> {
    last_updated: Option<DateTime<Utc>>,
    days_on_file: usize,
    error: Option<&'a str>,
    theme: &'a Theme,
}

impl<'a> StatusBar<'a> {
    pub fn new(
        last_updated: Option<DateTime<Utc>>,
        days_on_file: usize,
        error: Option<&'a str>,
        theme: &'a Theme,
    ) -> Self {
        StatusBar {
            last_updated,
            days_on_file,
            error,
            theme,
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let (text, style) = if let Some(e) = self.error {
            (format!("Error: {e}"), self.theme.level_style(Some(AlertLevel::Alert)))
        } else {
            let updated = self
                .last_updated
                .map(|t| {
                    t.with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                })
                .unwrap_or_else(|| "never".to_string());
            (
                format!(
                    "fxwatch | {} days | updated {updated} | [h] Help [q] Quit",
                    self.days_on_file
                ),
                self.theme.normal_style(),
            )
        };

        let paragraph = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::TOP).border_style(self.theme.border_style()));

        frame.render_widget(paragraph, area);
    }
}
