use log::LevelFilter;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::error::Result;
use crate::fmt::money;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const SELECTED_STYLE: Style = Style::new()
    .bg(Color::Rgb(40, 40, 60))
    .add_modifier(Modifier::BOLD);

pub const WARN_STYLE: Style = Style::new().fg(Color::Yellow);

/// Colors cycled through for chart series.
pub const SERIES_COLORS: [Color; 6] = [
    Color::Rgb(99, 110, 250),
    Color::Rgb(239, 85, 59),
    Color::Rgb(0, 204, 150),
    Color::Rgb(171, 99, 250),
    Color::Rgb(255, 161, 90),
    Color::Rgb(25, 211, 243),
];

pub fn series_style(i: usize) -> Style {
    Style::new().fg(SERIES_COLORS[i % SERIES_COLORS.len()])
}

/// Format an amount as a colored Span (green for payments, red for reversals).
pub fn money_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(money(amount), style)
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

/// Clamp an amount to a chart bar height. Bars cannot go below zero.
pub fn bar_value(amount: f64) -> u64 {
    amount.max(0.0).round() as u64
}

/// Suspends log output until dropped, then restores the previous level.
pub struct LogPause(LevelFilter);

impl LogPause {
    pub fn start() -> Self {
        let previous = log::max_level();
        log::set_max_level(LevelFilter::Off);
        Self(previous)
    }
}

impl Drop for LogPause {
    fn drop(&mut self) {
        log::set_max_level(self.0);
    }
}

/// Take over the terminal for `body`, restoring it afterwards even if the
/// body panics or fails. Logging is off while the terminal is in raw mode.
pub fn with_terminal<F>(body: F) -> Result<()>
where
    F: FnOnce(&mut ratatui::DefaultTerminal) -> Result<()>,
{
    let _logs = LogPause::start();
    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let result = body(&mut terminal);
    drop(terminal);
    ratatui::restore();
    result
}
