use crate::clock::{Clock, SystemClock};
use crate::config::GameConfig;
use crate::equation::{self, Equation};
use crate::error::{ErrorLatch, SessionError};
use crate::observable::{Subject, SubscriptionId};
use crate::scoring::{self, RoundResult, ScoreBoard};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// Authoritative game state, published whole on every change
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub active: bool,
    pub end: bool,
    pub question_value: u32,
    pub equation_active: usize,
    pub equations: Vec<Equation>,
    pub result: RoundResult,
    /// best total per question count; survives `reset`
    pub score: ScoreBoard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    Idle,
    Selecting,
    InProgress,
    Ended,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        match (self.active, self.end) {
            (_, true) => Phase::Ended,
            (true, false) => Phase::InProgress,
            (false, false) if self.question_value > 0 => Phase::Selecting,
            (false, false) => Phase::Idle,
        }
    }

    pub fn current_equation(&self) -> Option<&Equation> {
        self.equations.get(self.equation_active)
    }

    pub fn answered(&self) -> usize {
        self.equations.iter().filter(|eq| eq.answer.is_some()).count()
    }

    pub fn best_for(&self, question_value: u32) -> Option<f64> {
        self.score.get(&question_value).copied()
    }

    fn play_state(&self) -> PlayState {
        PlayState {
            active: self.active,
            end: self.end,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PlayState {
    active: bool,
    end: bool,
}

/// Watches the `(active, end)` pair and stamps the round's start and end.
#[derive(Debug, Default)]
struct RoundTimer {
    last: Option<PlayState>,
    start_ms: i64,
    end_ms: i64,
}

impl RoundTimer {
    /// Returns false when the pair is the same as last time.
    fn observe(&mut self, play: PlayState, clock: &dyn Clock) -> bool {
        if self.last == Some(play) {
            return false;
        }
        self.last = Some(play);

        match play {
            PlayState {
                active: true,
                end: false,
            } => self.start_ms = clock.now_ms(),
            PlayState { end: true, .. } => self.end_ms = clock.now_ms(),
            PlayState {
                active: false,
                end: false,
            } => {
                self.start_ms = 0;
                self.end_ms = 0;
            }
        }
        true
    }
}

/// One player's game session.
///
/// Every mutating operation first checks the error latch; once an operation
/// fails, the error is published on the error channel and the session ignores
/// everything but [`Session::reset`].
#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    state: Subject<SessionState>,
    error: Subject<Option<SessionError>>,
    latch: ErrorLatch,
    timer: RoundTimer,
    clock: Box<dyn Clock>,
    rng: StdRng,
}

impl Session {
    pub fn new(config: GameConfig) -> Self {
        Self::with_parts(config, SystemClock, StdRng::from_entropy())
    }

    pub fn with_parts(config: GameConfig, clock: impl Clock + 'static, rng: StdRng) -> Self {
        let mut session = Self {
            config,
            state: Subject::new(SessionState::default()),
            error: Subject::distinct(None),
            latch: ErrorLatch::new(),
            timer: RoundTimer::default(),
            clock: Box::new(clock),
            rng,
        };
        let initial = session.state.get().play_state();
        session.timer.observe(initial, session.clock.as_ref());
        session
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        self.state.get()
    }

    pub fn error(&self) -> Option<&SessionError> {
        self.error.get().as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.state().phase()
    }

    /// Milliseconds on the round clock: running while in progress, frozen once ended.
    pub fn elapsed_ms(&self) -> u64 {
        match self.phase() {
            Phase::InProgress => self.clock.now_ms().abs_diff(self.timer.start_ms),
            Phase::Ended => self.timer.end_ms.abs_diff(self.timer.start_ms),
            Phase::Idle | Phase::Selecting => 0,
        }
    }

    pub fn subscribe_state(
        &mut self,
        observer: impl FnMut(&SessionState) + 'static,
    ) -> SubscriptionId {
        self.state.subscribe(observer)
    }

    pub fn unsubscribe_state(&mut self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }

    pub fn subscribe_error(
        &mut self,
        observer: impl FnMut(&Option<SessionError>) + 'static,
    ) -> SubscriptionId {
        self.error.subscribe(observer)
    }

    /// Choose how many equations the next round has and deal them.
    pub fn select_count(&mut self, value: u32) {
        self.guarded(|session| session.apply_select(value));
    }

    pub fn start(&mut self) {
        self.guarded(Self::apply_start);
    }

    /// Record the player's judgement of the current equation.
    pub fn mark_answer(&mut self, judgement: bool) {
        self.guarded(|session| session.apply_mark(judgement));
    }

    pub fn mark_correct(&mut self) {
        self.mark_answer(true);
    }

    pub fn mark_incorrect(&mut self) {
        self.mark_answer(false);
    }

    /// Clear any latched error and return to idle, keeping the best-time ledger.
    pub fn reset(&mut self) {
        self.latch.clear();
        self.error.next(None);

        let score = self.state().score.clone();
        self.publish(SessionState {
            score,
            ..SessionState::default()
        });
        tracing::debug!(phase = %self.phase(), "session reset");
    }

    fn guarded(&mut self, op: impl FnOnce(&mut Self) -> Result<(), SessionError>) {
        if let Err(err) = self.latch.check() {
            tracing::debug!(%err, "operation rejected, session is latched");
            self.raise(err);
            return;
        }

        if let Err(err) = op(self) {
            tracing::warn!(%err, "session error latched");
            self.raise(err);
        }
    }

    fn raise(&mut self, err: SessionError) {
        self.latch.raise(err.clone());
        self.error.next(Some(err));
    }

    fn apply_select(&mut self, value: u32) -> Result<(), SessionError> {
        if self.state().active {
            tracing::debug!(value, "question count is fixed once a round has started");
            return Ok(());
        }

        let equations = equation::generate(&mut self.rng, value as usize);
        let mut next = self.state().clone();
        next.question_value = value;
        next.equation_active = 0;
        next.equations = equations;
        self.publish(next);
        Ok(())
    }

    fn apply_start(&mut self) -> Result<(), SessionError> {
        let current = self.state();
        if current.question_value == 0 {
            return Err(SessionError::question_not_selected());
        }
        if current.active {
            return Ok(());
        }

        let mut next = current.clone();
        next.active = true;
        tracing::info!(questions = next.question_value, "round started");
        self.publish(next);
        Ok(())
    }

    fn apply_mark(&mut self, judgement: bool) -> Result<(), SessionError> {
        let current = self.state();
        if !current.active || current.end {
            return Ok(());
        }

        let idx = current.equation_active;
        let last = current.equations.len().saturating_sub(1);
        let mut next = current.clone();
        match next.equations.get_mut(idx) {
            Some(eq) => eq.answer = Some(judgement),
            None => return Ok(()),
        }

        if idx < last {
            next.equation_active = idx + 1;
        } else {
            next.end = true;
        }
        self.publish(next);
        Ok(())
    }

    fn publish(&mut self, next: SessionState) {
        let play = next.play_state();
        self.state.next(next);
        self.on_play_state(play);
    }

    /// Scores the round when the `(active, end)` pair moves to ended.
    fn on_play_state(&mut self, play: PlayState) {
        if !self.timer.observe(play, self.clock.as_ref()) || !play.end {
            return;
        }

        let current = self.state();
        let scored = scoring::score(
            &current.equations,
            &current.score,
            current.question_value,
            self.timer.start_ms,
            self.timer.end_ms,
            self.config.penalty,
        );
        tracing::info!(
            questions = current.question_value,
            total = scored.result.total,
            base = scored.result.base,
            penalty = scored.result.penalty,
            "round finished"
        );

        let mut next = current.clone();
        next.result = scored.result;
        next.score = scored.score;
        self.publish(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::ErrorCode;
    use assert_matches::assert_matches;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn session() -> (Session, ManualClock) {
        let clock = ManualClock::new(10_000);
        let session = Session::with_parts(
            GameConfig::default(),
            clock.clone(),
            StdRng::seed_from_u64(3),
        );
        (session, clock)
    }

    /// Answer every equation, getting `mistakes` of them wrong, with the clock
    /// advancing `step_ms` before each mark.
    fn answer_all(session: &mut Session, clock: &ManualClock, mistakes: usize, step_ms: i64) {
        let mut wrong_left = mistakes;
        while !session.state().end {
            let truth = session
                .state()
                .current_equation()
                .expect("round in progress has a current equation")
                .is_true();
            clock.advance(step_ms);
            if wrong_left > 0 {
                wrong_left -= 1;
                session.mark_answer(!truth);
            } else {
                session.mark_answer(truth);
            }
        }
    }

    #[test]
    fn test_new_session_is_idle() {
        let (session, _) = session();
        assert_eq!(*session.state(), SessionState::default());
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.error(), None);
        assert_eq!(session.elapsed_ms(), 0);
    }

    #[test]
    fn test_select_then_start() {
        let (mut session, _) = session();
        session.select_count(10);
        assert_eq!(session.state().equations.len(), 10);
        assert_eq!(session.state().question_value, 10);
        assert_eq!(session.phase(), Phase::Selecting);

        session.start();
        assert!(session.state().active);
        assert!(!session.state().end);
        assert_eq!(session.phase(), Phase::InProgress);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_reselect_redeals() {
        let (mut session, _) = session();
        session.select_count(10);
        session.select_count(25);
        assert_eq!(session.state().question_value, 25);
        assert_eq!(session.state().equations.len(), 25);
    }

    #[test]
    fn test_start_without_selection_latches() {
        let (mut session, _) = session();
        session.start();

        assert!(!session.state().active);
        assert_matches!(
            session.error(),
            Some(SessionError {
                code: ErrorCode::QuestionNotSelected,
                ..
            })
        );
    }

    #[test]
    fn test_latched_session_is_inert() {
        let (mut session, _) = session();
        let emissions = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&emissions);
        session.subscribe_error(move |e| sink.borrow_mut().push(e.clone()));

        session.start();
        let before = session.state().clone();

        session.select_count(10);
        session.start();
        session.mark_correct();
        session.mark_incorrect();

        assert_eq!(*session.state(), before);
        assert_eq!(
            session.error().map(|e| e.code),
            Some(ErrorCode::QuestionNotSelected)
        );
        // initial None, then the one error; repeats are deduplicated
        assert_eq!(emissions.borrow().len(), 2);

        session.reset();
        assert_eq!(session.error(), None);
        session.select_count(10);
        session.start();
        assert!(session.state().active);
    }

    #[test]
    fn test_single_question_round() {
        let (mut session, clock) = session();
        session.select_count(1);
        session.start();
        clock.advance(2_345);
        session.mark_correct();

        let state = session.state();
        assert!(state.end);
        assert_eq!(state.equation_active, 0);
        assert_eq!(state.answered(), 1);
        // a single equation is always dealt true
        assert_eq!(state.result.penalty, 0);
        assert_eq!(state.result.base, 2_345);
        assert_eq!(state.result.total, 2.345);
        assert_eq!(state.best_for(1), Some(2.345));
        assert_eq!(session.phase(), Phase::Ended);
    }

    #[test]
    fn test_all_correct_has_no_penalty() {
        let (mut session, clock) = session();
        session.select_count(3);
        session.start();
        answer_all(&mut session, &clock, 0, 1_111);

        let result = session.state().result;
        assert_eq!(result.penalty, 0);
        assert_eq!(result.base, 3_333);
        assert_eq!(result.total, scoring::round4(result.base as f64 / 1000.0));
    }

    #[test]
    fn test_one_mistake_adds_penalty() {
        let (mut session, clock) = session();
        session.select_count(3);
        session.start();
        answer_all(&mut session, &clock, 1, 1_000);

        let result = session.state().result;
        assert_eq!(result.penalty, 1_500);
        assert_eq!(result.base, 3_000);
        assert_eq!(result.total, 4.5);
    }

    #[test]
    fn test_pointer_holds_at_last_equation() {
        let (mut session, _) = session();
        session.select_count(3);
        session.start();

        session.mark_correct();
        assert_eq!(session.state().equation_active, 1);
        session.mark_correct();
        assert_eq!(session.state().equation_active, 2);
        assert!(!session.state().end);
        session.mark_correct();
        assert_eq!(session.state().equation_active, 2);
        assert!(session.state().end);
    }

    #[test]
    fn test_marks_after_end_are_ignored() {
        let (mut session, clock) = session();
        session.select_count(2);
        session.start();
        answer_all(&mut session, &clock, 0, 500);
        let finished = session.state().clone();

        clock.advance(10_000);
        session.mark_incorrect();
        assert_eq!(*session.state(), finished);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn test_marks_before_start_are_ignored() {
        let (mut session, _) = session();
        session.select_count(5);
        session.mark_correct();

        assert_eq!(session.state().answered(), 0);
        assert_eq!(session.state().equation_active, 0);
    }

    #[test]
    fn test_select_during_round_is_ignored() {
        let (mut session, _) = session();
        session.select_count(10);
        session.start();
        let dealt = session.state().equations.clone();

        session.select_count(25);
        assert_eq!(session.state().question_value, 10);
        assert_eq!(session.state().equations, dealt);
    }

    #[test]
    fn test_result_untouched_until_round_ends() {
        let (mut session, clock) = session();
        session.select_count(3);
        session.start();
        clock.advance(700);
        session.mark_correct();

        assert_eq!(session.state().result, RoundResult::default());
        assert!(session.state().score.is_empty());
    }

    #[test]
    fn test_reset_keeps_only_score() {
        let (mut session, clock) = session();
        session.select_count(1);
        session.start();
        clock.advance(1_000);
        session.mark_correct();
        let score = session.state().score.clone();

        session.reset();
        let once = session.state().clone();
        session.reset();

        assert_eq!(*session.state(), once);
        assert_eq!(
            once,
            SessionState {
                score,
                ..SessionState::default()
            }
        );
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn test_best_time_never_increases() {
        let (mut session, clock) = session();
        let mut history = Vec::new();

        for (step, mistakes) in [(900, 0), (400, 1), (1_500, 0), (300, 0), (2_000, 2)] {
            session.reset();
            session.select_count(3);
            session.start();
            answer_all(&mut session, &clock, mistakes, step);
            history.push(session.state().best_for(3).unwrap());
        }

        assert!(history.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(history[0], 2.7);
        assert_eq!(history[3], 0.9);
    }

    #[test]
    fn test_second_round_restarts_clock() {
        let (mut session, clock) = session();
        session.select_count(1);
        session.start();
        clock.advance(5_000);
        session.mark_correct();
        assert_eq!(session.state().result.base, 5_000);

        session.reset();
        clock.advance(60_000);
        session.select_count(1);
        session.start();
        clock.advance(800);
        session.mark_correct();

        assert_eq!(session.state().result.base, 800);
        assert_eq!(session.state().best_for(1), Some(0.8));
    }

    #[test]
    fn test_reset_mid_round_restarts_clock() {
        let (mut session, clock) = session();
        session.select_count(2);
        session.start();
        clock.advance(4_000);
        session.reset();

        session.select_count(1);
        session.start();
        clock.advance(250);
        session.mark_correct();
        assert_eq!(session.state().result.base, 250);
    }

    #[test]
    fn test_elapsed_runs_then_freezes() {
        let (mut session, clock) = session();
        session.select_count(1);
        session.start();
        clock.advance(1_200);
        assert_eq!(session.elapsed_ms(), 1_200);

        session.mark_correct();
        clock.advance(9_000);
        assert_eq!(session.elapsed_ms(), 1_200);

        session.reset();
        assert_eq!(session.elapsed_ms(), 0);
    }

    #[test]
    fn test_state_channel_emits_every_change() {
        let (mut session, clock) = session();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = session.subscribe_state(move |s| sink.borrow_mut().push(s.phase()));

        session.select_count(1);
        session.start();
        clock.advance(10);
        session.mark_correct();

        // zero-state, select, start, mark, then the scored result
        assert_eq!(
            *seen.borrow(),
            vec![
                Phase::Idle,
                Phase::Selecting,
                Phase::InProgress,
                Phase::Ended,
                Phase::Ended
            ]
        );

        assert!(session.unsubscribe_state(id));
        session.reset();
        assert_eq!(seen.borrow().len(), 5);
    }

    #[test]
    fn test_custom_penalty_is_used() {
        let clock = ManualClock::new(0);
        let config = GameConfig {
            penalty: 250,
            questions: vec![2],
        };
        let mut session =
            Session::with_parts(config, clock.clone(), StdRng::seed_from_u64(11));
        session.select_count(2);
        session.start();
        answer_all(&mut session, &clock, 2, 100);

        assert_eq!(session.state().result.penalty, 500);
        assert_eq!(session.state().result.total, 0.7);
        assert_eq!(session.config().penalty, 250);
    }
}
