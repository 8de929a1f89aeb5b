//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::QuizError;
use storage::repository::StorageError;

/// Errors emitted by quiz session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no authenticated user")]
    Unauthenticated,
    #[error("quiz is not finished yet")]
    NotFinished,
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
