use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

use crate::{
    app::{App, AppScreen},
    ui::{bold, centered, dim, format_ledger, format_ms, frame_chunks, help, highlight},
};

/// A UI screen boundary: renders one view of the session
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

fn render_title(title: &str, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(title.to_string(), highlight()))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM))
        .render(area, buf);
}

fn render_help(text: &str, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(text.to_string(), help()))
        .alignment(Alignment::Center)
        .render(area, buf);
}

/// Question count picker
pub struct SelectScreen;

impl Screen for SelectScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (header, body, footer) = frame_chunks(area);
        render_title("Math Sprint", header, buf);

        let state = app.session.state();
        let mut lines = vec![
            Line::from(Span::styled("How many questions?", bold())),
            Line::default(),
        ];
        lines.extend(
            app.session
                .config()
                .questions
                .iter()
                .enumerate()
                .map(|(idx, &count)| {
                    let marker = if state.question_value == count && count > 0 {
                        "›"
                    } else {
                        " "
                    };
                    let best = state
                        .best_for(count)
                        .map(|b| format!("best {b}s"))
                        .unwrap_or_default();
                    let text = format!("{marker} {}. {count:>3} questions  {best}", idx + 1);
                    let style = if idx == app.highlighted {
                        highlight()
                    } else {
                        Style::default()
                    };
                    Line::from(Span::styled(text, style))
                }),
        );

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);

        render_help("↑/↓ choose · enter start · esc quit", footer, buf);
    }
}

/// The running round: current equation with its neighbours and the clock
pub struct GameScreen;

/// equations shown above and below the current one
const CONTEXT_LINES: usize = 3;

impl Screen for GameScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (header, body, footer) = frame_chunks(area);
        let state = app.session.state();

        let title = format!(
            "Question {}/{}   {}",
            state.equation_active + 1,
            state.equations.len(),
            format_ms(app.session.elapsed_ms())
        );
        render_title(&title, header, buf);

        let first = state.equation_active.saturating_sub(CONTEXT_LINES);
        let lines: Vec<Line> = state
            .equations
            .iter()
            .enumerate()
            .skip(first)
            .take(CONTEXT_LINES * 2 + 1)
            .map(|(idx, eq)| {
                if idx == state.equation_active {
                    Line::from(Span::styled(format!("» {eq} «"), highlight()))
                } else if eq.answer.is_some() {
                    Line::from(Span::styled(eq.to_string(), dim()))
                } else {
                    Line::from(eq.to_string())
                }
            })
            .collect();

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);

        render_help("← wrong · → right · esc quit", footer, buf);
    }
}

/// Final, base and penalty time for the finished round
pub struct ScoreScreen;

impl Screen for ScoreScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let (header, body, footer) = frame_chunks(area);
        render_title("Your Time", header, buf);

        let state = app.session.state();
        let result = state.result;
        let mistakes = state
            .equations
            .iter()
            .filter(|eq| !eq.is_judged_correctly())
            .count();
        let best = state
            .best_for(state.question_value)
            .map(|b| format!("{b}s"))
            .unwrap_or_else(|| "-".to_string());

        let row = |label: &str, value: String| {
            Line::from(vec![
                Span::styled(format!("{label:>8}  "), bold()),
                Span::raw(value),
            ])
        };
        let lines = vec![
            row("Final", format!("{}s", result.total)),
            row("Base", format_ms(result.base)),
            row("Penalty", format_ms(result.penalty)),
            row("Mistakes", format!("{mistakes}/{}", state.equations.len())),
            row("Best", best),
            Line::default(),
            Line::from(Span::styled(format_ledger(&state.score), dim())),
        ];

        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .render(body, buf);

        render_help("enter play again · esc quit", footer, buf);
    }
}

/// Latched session error drawn over the select screen
pub struct ErrorScreen;

impl Screen for ErrorScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        SelectScreen.render(app, area, buf);

        let Some(err) = app.session.error() else {
            return;
        };

        let popup = centered(area, 50, 7);
        Clear.render(popup, buf);
        let lines = vec![
            Line::from(Span::styled(err.message.clone(), bold())),
            Line::from(Span::styled(
                format!("{} · status {}", err.code, err.status),
                dim(),
            )),
            Line::default(),
            Line::from(Span::styled("enter/r reset · esc quit", help())),
        ];
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red))
                    .title("Error"),
            )
            .render(popup, buf);
    }
}

/// Helper to construct the screen for the current state
pub fn current_screen(screen: AppScreen) -> Box<dyn Screen> {
    match screen {
        AppScreen::Select => Box::new(SelectScreen),
        AppScreen::Game => Box::new(GameScreen),
        AppScreen::Score => Box::new(ScoreScreen),
        AppScreen::Error => Box::new(ErrorScreen),
    }
}
