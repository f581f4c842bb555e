use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::runtime::GameEvent;
use crate::session::{Phase, Session};

/// Which screen the terminal shows; derived from the session, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppScreen {
    Select,
    Game,
    Score,
    Error,
}

/// Terminal front-end state wrapped around a [`Session`]
#[derive(Debug)]
pub struct App {
    pub session: Session,
    /// highlighted entry in the configured question counts
    pub highlighted: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            highlighted: 0,
            should_quit: false,
        }
    }

    pub fn screen(&self) -> AppScreen {
        if self.session.error().is_some() {
            return AppScreen::Error;
        }

        match self.session.phase() {
            Phase::Idle | Phase::Selecting => AppScreen::Select,
            Phase::InProgress => AppScreen::Game,
            Phase::Ended => AppScreen::Score,
        }
    }

    pub fn highlighted_count(&self) -> Option<u32> {
        self.session.config().questions.get(self.highlighted).copied()
    }

    /// Apply one event. Returns true when the screen should be redrawn.
    pub fn on_event(&mut self, event: GameEvent) -> bool {
        match event {
            // only the running round clock changes between keystrokes
            GameEvent::Tick => self.screen() == AppScreen::Game,
            GameEvent::Resize => true,
            GameEvent::Closed => {
                self.should_quit = true;
                false
            }
            GameEvent::Key(key) => {
                self.on_key(key);
                true
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }

        match self.screen() {
            AppScreen::Error => match key.code {
                KeyCode::Enter | KeyCode::Char('r') => self.session.reset(),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
            AppScreen::Select => match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.move_highlight(-1),
                KeyCode::Down | KeyCode::Char('j') => self.move_highlight(1),
                KeyCode::Char(c @ '1'..='9') => {
                    let idx = c as usize - '1' as usize;
                    if idx < self.session.config().questions.len() {
                        self.choose(idx);
                    }
                }
                KeyCode::Enter | KeyCode::Char(' ') => self.session.start(),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
            AppScreen::Game => match key.code {
                KeyCode::Right | KeyCode::Char('y') => self.session.mark_correct(),
                KeyCode::Left | KeyCode::Char('n') => self.session.mark_incorrect(),
                _ => {}
            },
            AppScreen::Score => match key.code {
                KeyCode::Enter | KeyCode::Char('r') => self.session.reset(),
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            },
        }
    }

    fn move_highlight(&mut self, delta: isize) {
        let len = self.session.config().questions.len();
        if len == 0 {
            return;
        }
        let idx = (self.highlighted as isize + delta).rem_euclid(len as isize) as usize;
        self.choose(idx);
    }

    fn choose(&mut self, idx: usize) {
        self.highlighted = idx;
        if let Some(count) = self.highlighted_count() {
            self.session.select_count(count);
        }
    }
}
