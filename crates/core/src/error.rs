use thiserror::Error;

/// Errors raised when a quiz session cannot be started.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("not enough questions: {available} available, {required} required")]
    InsufficientQuestions { available: usize, required: usize },

    #[error("daily limit reached: {played} of {limit} games played today")]
    DailyLimitReached { played: u32, limit: u32 },

    #[error("quiz already started")]
    AlreadyStarted,
}
