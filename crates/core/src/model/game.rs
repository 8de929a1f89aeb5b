use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::model::ids::{GameId, UserId};

/// Final result of a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizOutcome {
    score: u32,
    total: u32,
    gain: i64,
}

impl QuizOutcome {
    #[must_use]
    pub fn new(score: u32, total: u32, gain: i64) -> Self {
        Self { score, total, gain }
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn gain(&self) -> i64 {
        self.gain
    }
}

/// A played game as recorded in the player's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRecord {
    id: GameId,
    user_id: UserId,
    score: u32,
    gain: i64,
    played_at: DateTime<Utc>,
}

impl GameRecord {
    #[must_use]
    pub fn from_persisted(
        id: GameId,
        user_id: UserId,
        score: u32,
        gain: i64,
        played_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            score,
            gain,
            played_at,
        }
    }

    #[must_use]
    pub fn id(&self) -> GameId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn gain(&self) -> i64 {
        self.gain
    }

    #[must_use]
    pub fn played_at(&self) -> DateTime<Utc> {
        self.played_at
    }
}
