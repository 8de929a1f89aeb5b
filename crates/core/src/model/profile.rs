use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::model::game::QuizOutcome;
use crate::model::ids::UserId;

/// Minimum length of a display name, in characters.
pub const MIN_PSEUDO_LEN: usize = 3;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("pseudo must be at least 3 characters")]
    PseudoTooShort,

    #[error("phone number cannot be empty")]
    EmptyPhone,
}

/// A player's account state: balance and daily play counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    id: UserId,
    pseudo: String,
    phone: Option<String>,
    balance: i64,
    games_played_today: u32,
    last_game_date: Option<NaiveDate>,
}

impl Profile {
    /// Create a brand-new profile with an empty balance.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if the pseudo is too short or the phone is blank.
    pub fn new(
        id: UserId,
        pseudo: impl Into<String>,
        phone: Option<String>,
    ) -> Result<Self, ProfileError> {
        Self::from_persisted(id, pseudo, phone, 0, 0, None)
    }

    /// Rehydrate a profile from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError` if the pseudo is too short or the phone is blank.
    pub fn from_persisted(
        id: UserId,
        pseudo: impl Into<String>,
        phone: Option<String>,
        balance: i64,
        games_played_today: u32,
        last_game_date: Option<NaiveDate>,
    ) -> Result<Self, ProfileError> {
        let pseudo = pseudo.into().trim().to_string();
        if pseudo.chars().count() < MIN_PSEUDO_LEN {
            return Err(ProfileError::PseudoTooShort);
        }
        let phone = match phone.map(|p| p.trim().to_string()) {
            Some(p) if p.is_empty() => return Err(ProfileError::EmptyPhone),
            other => other,
        };

        Ok(Self {
            id,
            pseudo,
            phone,
            balance,
            games_played_today,
            last_game_date,
        })
    }

    #[must_use]
    pub fn id(&self) -> UserId {
        self.id
    }

    #[must_use]
    pub fn pseudo(&self) -> &str {
        &self.pseudo
    }

    #[must_use]
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    #[must_use]
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Raw stored counter, regardless of when it was last written.
    #[must_use]
    pub fn games_played_today(&self) -> u32 {
        self.games_played_today
    }

    #[must_use]
    pub fn last_game_date(&self) -> Option<NaiveDate> {
        self.last_game_date
    }

    /// Games played on `today`. The stored counter only counts for the day it was written.
    #[must_use]
    pub fn games_played_on(&self, today: NaiveDate) -> u32 {
        match self.last_game_date {
            Some(date) if date >= today => self.games_played_today,
            _ => 0,
        }
    }

    /// Values to persist after `outcome` was played on `today`.
    #[must_use]
    pub fn update_for(&self, outcome: &QuizOutcome, today: NaiveDate) -> ProfileUpdate {
        ProfileUpdate {
            balance: self.balance.saturating_add(outcome.gain()),
            games_played_today: self.games_played_on(today).saturating_add(1),
            last_game_date: today,
        }
    }

    /// Apply a persisted update to this in-memory copy.
    pub fn apply(&mut self, update: &ProfileUpdate) {
        self.balance = update.balance;
        self.games_played_today = update.games_played_today;
        self.last_game_date = Some(update.last_game_date);
    }
}

/// New balance and counters written back after a finished quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub balance: i64,
    pub games_played_today: u32,
    pub last_game_date: NaiveDate,
}
