pub mod screen;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::Widget,
};

use crate::{app::App, scoring::ScoreBoard};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

pub(crate) fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

pub(crate) fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

pub(crate) fn highlight() -> Style {
    bold().fg(Color::Cyan)
}

pub(crate) fn help() -> Style {
    Style::default()
        .add_modifier(Modifier::ITALIC)
        .fg(Color::Magenta)
}

/// Seconds with millisecond precision, e.g. `12.345s`
pub fn format_ms(ms: u64) -> String {
    format!("{:.3}s", ms as f64 / 1000.0)
}

/// One `count: best` entry per played question count, e.g. `10: 8.25s, 25: 21.7s`
pub fn format_ledger(score: &ScoreBoard) -> String {
    if score.is_empty() {
        return "no rounds finished".to_string();
    }
    score
        .iter()
        .map(|(count, best)| format!("{count}: {best}s"))
        .join(", ")
}

/// Split the frame into header, body and footer rows inside the outer margins
pub(crate) fn frame_chunks(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(area);

    (chunks[0], chunks[1], chunks[2])
}

/// `width` x `height` rectangle centered in `area`, clipped to fit
pub(crate) fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let screen = screen::current_screen(self.screen());
        screen.render(self, area, buf);
    }
}
