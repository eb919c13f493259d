//! Theme configuration for the TUI.

use ratatui::style::{Color, Modifier, Style};

use crate::alerts::AlertLevel;

/// Color theme for the application
#[derive(Debug, Clone)]
pub struct Theme {
    pub bg: Color,
    pub fg: Color,
    pub highlight_bg: Color,
    pub highlight_fg: Color,
    pub border: Color,
    pub title: Color,
    pub level_normal: Color,
    pub level_warning: Color,
    pub level_alert: Color,
    pub rate_line: Color,
    pub mean_line: Color,
    pub one_sigma_band: Color,
    pub two_sigma_band: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            bg: Color::Reset,
            fg: Color::White,
            highlight_bg: Color::Rgb(60, 60, 80),
            highlight_fg: Color::White,
            border: Color::Rgb(100, 100, 120),
            title: Color::Cyan,
            level_normal: Color::Green,
            level_warning: Color::Yellow,
            level_alert: Color::Red,
            // Named colors for better terminal compatibility
            rate_line: Color::Cyan,
            mean_line: Color::Green,
            one_sigma_band: Color::Yellow,
            two_sigma_band: Color::LightRed,
        }
    }
}

impl Theme {
    /// Base surface style used to paint widget backgrounds
    pub fn surface_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Convenience helper returning (border_style, title_style) for focus state
    pub fn panel_styles(&self, focused: bool) -> (Style, Style) {
        if focused {
            (self.focused_border_style(), self.focused_border_style())
        } else {
            (self.border_style(), self.dimmed_title_style())
        }
    }

    /// Get style for normal text
    pub fn normal_style(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    /// Get style for highlighted/selected items
    pub fn highlight_style(&self) -> Style {
        Style::default()
            .fg(self.highlight_fg)
            .bg(self.highlight_bg)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for borders
    pub fn border_style(&self) -> Style {
        Style::default().fg(self.border)
    }

    /// Get style for focused panel borders (distinct from normal borders)
    pub fn focused_border_style(&self) -> Style {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for titles
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.title)
            .add_modifier(Modifier::BOLD)
    }

    /// Get style for unfocused/dimmed titles
    pub fn dimmed_title_style(&self) -> Style {
        Style::default()
            .fg(self.border)
            .add_modifier(Modifier::DIM)
    }

    /// Color for a pair's alert state
    pub fn level_color(&self, level: Option<AlertLevel>) -> Color {
        match level {
            Some(AlertLevel::Alert) => self.level_alert,
            Some(AlertLevel::Warning) => self.level_warning,
            None => self.level_normal,
        }
    }

    pub fn level_style(&self, level: Option<AlertLevel>) -> Style {
        let style = Style::default().fg(self.level_color(level));
        if level == Some(AlertLevel::Alert) {
            style.add_modifier(Modifier::BOLD)
        } else {
            style
        }
    }
}
