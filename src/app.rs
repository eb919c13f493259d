//! Main application logic and TUI event loop.

use std::io;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::alerts::DeviationEngine;
use crate::cli::AppConfig;
use crate::data::{RateStore, Storage};
use crate::ui::{
    chart::{RangeSelector, RateChart, RANGES},
    widgets::{PairList, PairRow, StatsPanel, StatusBar},
    HelpOverlay, Theme,
};

/// Index into [`RANGES`] for a requested number of days.
///
/// Picks the smallest preset covering the request, or the longest preset.
fn range_index_for(days: usize) -> usize {
    RANGES
        .iter()
        .position(|&r| r >= days)
        .unwrap_or(RANGES.len() - 1)
}

/// Application state
pub struct App {
    // Configuration
    theme: Theme,
    engine: DeviationEngine,
    refresh_interval: Duration,

    // Data
    storage: Storage,
    store: RateStore,
    last_updated: Option<DateTime<Utc>>,
    rows: Vec<PairRow>,

    // UI State
    selected_pair: usize,
    selected_range: usize,
    show_help: bool,

    // Timing
    last_refresh: Instant,

    // Exit flag
    should_quit: bool,

    // Error message to display (non-fatal)
    error_message: Option<String>,
}

impl App {
    /// Create a new App instance
    pub fn new(config: AppConfig, range_days: usize, refresh_secs: u64) -> Result<Self> {
        let mut app = App {
            theme: Theme::default(),
            engine: DeviationEngine::new(config.deviation),
            refresh_interval: Duration::from_secs(refresh_secs.max(1)),
            storage: Storage::new(config.data_file),
            store: RateStore::new(),
            last_updated: None,
            rows: Vec::new(),
            selected_pair: 0,
            selected_range: range_index_for(range_days),
            show_help: false,
            last_refresh: Instant::now(),
            should_quit: false,
            error_message: None,
        };

        // Initial data load
        app.load_history()?;

        Ok(app)
    }

    /// Reload the history file and recompute every row
    fn load_history(&mut self) -> Result<()> {
        let history = self.storage.load_store()?;
        self.store = history.store;
        self.last_updated = history.last_updated;
        self.rebuild_rows();
        Ok(())
    }

    /// Recompute per-pair statistics for the current range
    fn rebuild_rows(&mut self) {
        let range = RANGES[self.selected_range];
        self.rows = self
            .engine
            .config()
            .currencies
            .iter()
            .map(|currency| {
                let evaluation = self.engine.evaluate(currency, &self.store);
                let level = evaluation
                    .result()
                    .and_then(|r| self.engine.config().classify(r.abs_deviation));
                PairRow {
                    currency: currency.clone(),
                    summary: self.engine.summary(currency, &self.store, range),
                    evaluation,
                    level,
                }
            })
            .collect();

        if self.selected_pair >= self.rows.len() {
            self.selected_pair = self.rows.len().saturating_sub(1);
        }
    }

    /// Refresh all data from disk
    fn refresh(&mut self) -> Result<()> {
        self.error_message = None; // Clear any previous errors
        self.last_refresh = Instant::now();
        self.load_history()
    }

    /// Set an error message to display (non-fatal)
    pub fn set_error(&mut self, message: String) {
        self.error_message = Some(message);
    }

    fn select_range(&mut self, index: usize) {
        if index < RANGES.len() && index != self.selected_range {
            self.selected_range = index;
            self.rebuild_rows();
        }
    }

    /// Handle keyboard input
    fn handle_input(&mut self, key: KeyCode) -> Result<()> {
        // Global shortcuts
        match key {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::F(1) => {
                self.show_help = !self.show_help;
                return Ok(());
            }
            KeyCode::Esc if self.show_help => {
                self.show_help = false;
                return Ok(());
            }
            KeyCode::Char('r') => {
                self.refresh()?;
                return Ok(());
            }
            _ => {}
        }

        // If help is shown, don't process other keys
        if self.show_help {
            return Ok(());
        }

        match key {
            // Range selection with number keys
            KeyCode::Char(c @ '1'..='9') => {
                if let Some(n) = c.to_digit(10) {
                    self.select_range(n as usize - 1);
                }
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.select_range((self.selected_range + 1).min(RANGES.len() - 1));
            }
            KeyCode::Left => {
                self.select_range(self.selected_range.saturating_sub(1));
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if !self.rows.is_empty() {
                    self.selected_pair = (self.selected_pair + 1) % self.rows.len();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if !self.rows.is_empty() {
                    self.selected_pair = self
                        .selected_pair
                        .checked_sub(1)
                        .unwrap_or(self.rows.len() - 1);
                }
            }
            _ => {}
        }

        Ok(())
    }

    /// Render the UI
    fn render(&self, frame: &mut ratatui::Frame) {
        let size = frame.area();

        // Main layout: body, footer
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),    // Body
                Constraint::Length(2), // Status bar
            ])
            .split(size);

        // Body layout: sidebar (left) and content (right)
        let body_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(28), // Sidebar
                Constraint::Min(40),    // Content
            ])
            .split(main_chunks[0]);

        // Sidebar layout: pair list, statistics
        let sidebar_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(6),     // Pairs
                Constraint::Length(12), // Statistics
            ])
            .split(body_chunks[0]);

        // Content layout: chart and range selector
        let content_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),   // Chart
                Constraint::Length(1), // Range selector
            ])
            .split(body_chunks[1]);

        let range = RANGES[self.selected_range];
        let row = self.rows.get(self.selected_pair);

        let pair_list = PairList::new(&self.rows, self.selected_pair, &self.theme);
        pair_list.render(frame, sidebar_chunks[0], true);

        let stats = StatsPanel::new(row, range, self.engine.config().window_days, &self.theme);
        stats.render(frame, sidebar_chunks[1]);

        // Render chart
        let series = row
            .map(|r| self.store.series(&r.currency, range))
            .unwrap_or_default();
        let title = row
            .map(|r| format!("{} · last {range} days", r.pair_name()))
            .unwrap_or_else(|| "No pair selected".to_string());
        let chart = RateChart::new(
            &series,
            row.and_then(|r| r.summary.as_ref()),
            &title,
            &self.theme,
        );
        chart.render(frame, content_chunks[0]);

        let range_selector = RangeSelector::new(self.selected_range, &self.theme);
        range_selector.render(frame, content_chunks[1]);

        // Render status bar
        let status_bar = StatusBar::new(
            self.last_updated,
            self.store.len(),
            self.error_message.as_deref(),
            &self.theme,
        );
        status_bar.render(frame, main_chunks[1]);

        // Render help overlay if active
        if self.show_help {
            let help = HelpOverlay::new(&self.theme, self.engine.config());
            help.render(frame, size);
        }
    }
}

/// Restore terminal to normal state
fn restore_terminal() {
    // Best effort cleanup - ignore errors since we may be in a panic
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

/// Run the TUI application
pub fn run(config: AppConfig, range_days: usize, refresh_secs: u64) -> Result<()> {
    // Check if the history file exists
    let data_file = &config.data_file;
    if !data_file.exists() {
        eprintln!("No rate history found at: {data_file:?}");
        eprintln!("Run `fxwatch backfill` or `fxwatch update` first, or point --data-file at an existing history");
        return Ok(());
    }

    // Load before touching the terminal so parse errors print normally
    let mut app = App::new(config, range_days, refresh_secs)
        .context("Failed to initialize application")?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen, EnableMouseCapture) {
        restore_terminal();
        return Err(e).context("Failed to setup terminal");
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            restore_terminal();
            return Err(e).context("Failed to create terminal");
        }
    };

    let result = run_main_loop(&mut terminal, &mut app);

    // Always restore terminal, regardless of result
    restore_terminal();
    terminal.show_cursor().ok();

    result
}

/// Main application loop
fn run_main_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Render - if this fails, we should exit
        terminal.draw(|f| app.render(f))?;

        // Reload on the refresh interval (errors go to the status bar)
        if app.last_refresh.elapsed() >= app.refresh_interval {
            if let Err(e) = app.refresh() {
                app.set_error(format!("Refresh error: {e:#}"));
            }
        }

        // Handle input with timeout
        let timeout = app
            .refresh_interval
            .saturating_sub(app.last_refresh.elapsed());
        if event::poll(timeout.min(Duration::from_millis(100)))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Err(e) = app.handle_input(key.code) {
                        app.set_error(format!("Input error: {e:#}"));
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alerts::{AlertLevel, DeviationConfig, Evaluation};
    use crate::data::Snapshot;
    use chrono::{Duration as ChronoDuration, NaiveDate};

    fn app_with(cny: &[f64], sgd: &[f64]) -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            data_file: dir.path().join("historical.json"),
            deviation: DeviationConfig {
                currencies: vec!["CNY".to_string(), "SGD".to_string()],
                ..DeviationConfig::default()
            },
        };

        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut store = RateStore::new();
        for i in 0..cny.len().max(sgd.len()) {
            let mut rates = std::collections::BTreeMap::new();
            if let Some(v) = cny.get(i) {
                rates.insert("CNY".to_string(), *v);
            }
            if let Some(v) = sgd.get(i) {
                rates.insert("SGD".to_string(), *v);
            }
            store
                .upsert(Snapshot {
                    date: start + ChronoDuration::days(i as i64),
                    base: "USD".to_string(),
                    rates,
                })
                .unwrap();
        }
        Storage::new(config.data_file.clone())
            .save(&store, None, &config.deviation.currencies)
            .unwrap();

        let app = App::new(config, 90, 60).unwrap();
        (dir, app)
    }

    #[test]
    fn test_range_index_for() {
        assert_eq!(range_index_for(7), 0);
        assert_eq!(range_index_for(30), 0);
        assert_eq!(range_index_for(100), 2);
        assert_eq!(range_index_for(365), 3);
        assert_eq!(range_index_for(2000), 3);
    }

    #[test]
    fn test_rows_follow_configured_currencies() {
        let (_dir, app) = app_with(&[1.00, 1.00, 1.00, 1.00, 1.30], &[1.34, 1.34]);

        assert_eq!(app.rows.len(), 2);
        assert_eq!(app.rows[0].currency, "CNY");
        assert_eq!(app.rows[0].level, Some(AlertLevel::Warning));
        assert_eq!(app.rows[1].currency, "SGD");
        assert_eq!(app.rows[1].evaluation, Evaluation::Degenerate);
        assert_eq!(app.rows[1].level, None);
        assert!(app.last_updated.is_some());
    }

    #[test]
    fn test_pair_navigation_wraps() {
        let (_dir, mut app) = app_with(&[7.1, 7.2], &[1.34, 1.35]);

        app.handle_input(KeyCode::Down).unwrap();
        assert_eq!(app.selected_pair, 1);
        app.handle_input(KeyCode::Char('j')).unwrap();
        assert_eq!(app.selected_pair, 0);
        app.handle_input(KeyCode::Up).unwrap();
        assert_eq!(app.selected_pair, 1);
    }

    #[test]
    fn test_range_keys() {
        let (_dir, mut app) = app_with(&[7.1, 7.2], &[1.34, 1.35]);
        assert_eq!(app.selected_range, 1);

        app.handle_input(KeyCode::Char('4')).unwrap();
        assert_eq!(app.selected_range, 3);
        app.handle_input(KeyCode::Right).unwrap();
        assert_eq!(app.selected_range, 3);
        app.handle_input(KeyCode::Left).unwrap();
        assert_eq!(app.selected_range, 2);
        app.handle_input(KeyCode::Char('9')).unwrap();
        assert_eq!(app.selected_range, 2);
    }

    #[test]
    fn test_help_swallows_navigation() {
        let (_dir, mut app) = app_with(&[7.1, 7.2], &[1.34, 1.35]);

        app.handle_input(KeyCode::Char('?')).unwrap();
        assert!(app.show_help);
        app.handle_input(KeyCode::Down).unwrap();
        assert_eq!(app.selected_pair, 0);
        app.handle_input(KeyCode::Esc).unwrap();
        assert!(!app.show_help);

        app.handle_input(KeyCode::Char('q')).unwrap();
        assert!(app.should_quit);
    }
}
