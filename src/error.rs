use serde::Serialize;
use thiserror::Error;

/// Status carried by game-rule violations.
pub const GAME_RULE_STATUS: u16 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorCode {
    /// `start` was called before a question count was chosen
    QuestionNotSelected,
}

/// Fault raised by a session operation and held by the latch until reset
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{message} ({code}, status {status})")]
pub struct SessionError {
    pub message: String,
    pub code: ErrorCode,
    pub status: u16,
}

impl SessionError {
    pub fn new(message: impl Into<String>, code: ErrorCode, status: u16) -> Self {
        Self {
            message: message.into(),
            code,
            status,
        }
    }

    pub fn question_not_selected() -> Self {
        Self::new(
            "Question not selected",
            ErrorCode::QuestionNotSelected,
            GAME_RULE_STATUS,
        )
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question list must not be empty")]
    EmptyQuestions,

    #[error("question count must be greater than zero")]
    ZeroQuestionCount,

    #[error("question count {count} is over the limit of {max}")]
    QuestionCountTooLarge { count: u32, max: u32 },
}

/// Single-slot sticky error: once raised, every check fails with the same
/// error until cleared.
#[derive(Debug, Default, Clone)]
pub struct ErrorLatch {
    slot: Option<SessionError>,
}

impl ErrorLatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&self) -> Result<(), SessionError> {
        match &self.slot {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn raise(&mut self, err: SessionError) {
        self.slot = Some(err);
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }
}
