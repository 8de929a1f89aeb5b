mod runner;
mod service;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use runner::run_quiz;
pub use service::{FinishReport, PersistenceStatus, QuizSession, QuizSessionService};
