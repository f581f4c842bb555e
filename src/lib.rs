// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod clock;
pub mod config;
pub mod equation;
pub mod error;
pub mod observable;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod ui;

pub use config::GameConfig;
pub use error::{ErrorCode, SessionError};
pub use session::{Phase, Session, SessionState};
