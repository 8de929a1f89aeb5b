use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{GameRecord, Profile, QuizRules, UserId};
use serde::Serialize;
use storage::repository::{GameRepository, ProfileRepository, StorageError};

/// Number of past games shown in the history.
pub const HISTORY_LIMIT: u32 = 10;

/// What the home screen shows: balance, today's plays and recent games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardOverview {
    pub profile: Profile,
    pub games_played_today: u32,
    pub daily_limit: u32,
    pub can_play: bool,
    pub recent_games: Vec<GameRecord>,
}

#[derive(Clone)]
pub struct DashboardService {
    clock: Clock,
    rules: QuizRules,
    profiles: Arc<dyn ProfileRepository>,
    games: Arc<dyn GameRepository>,
}

impl DashboardService {
    #[must_use]
    pub fn new(
        clock: Clock,
        rules: QuizRules,
        profiles: Arc<dyn ProfileRepository>,
        games: Arc<dyn GameRepository>,
    ) -> Self {
        Self {
            clock,
            rules,
            profiles,
            games,
        }
    }

    /// Load the overview for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown user, or other storage errors.
    pub async fn overview(&self, user_id: UserId) -> Result<DashboardOverview, StorageError> {
        let profile = self.profiles.get_profile(user_id).await?;
        let recent_games = self.games.recent_games(user_id, HISTORY_LIMIT).await?;
        let games_played_today = profile.games_played_on(self.clock.today());

        Ok(DashboardOverview {
            profile,
            games_played_today,
            daily_limit: self.rules.daily_limit(),
            can_play: games_played_today < self.rules.daily_limit(),
            recent_games,
        })
    }
}
