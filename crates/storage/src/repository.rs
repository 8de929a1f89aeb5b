use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{
    GameId, GameRecord, Profile, ProfileUpdate, Question, QuestionId, QuizOutcome, UserId,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Game row to insert; the repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGameRecord {
    pub user_id: UserId,
    pub score: u32,
    pub gain: i64,
    pub played_at: DateTime<Utc>,
}

impl NewGameRecord {
    #[must_use]
    pub fn from_outcome(user_id: UserId, outcome: &QuizOutcome, played_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            score: outcome.score(),
            gain: outcome.gain(),
            played_at,
        }
    }
}

/// Repository contract for the question pool.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Persist or update a question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Fetch the whole question pool, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store is unreachable or a row is malformed.
    async fn list_questions(&self) -> Result<Vec<Question>, StorageError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Persist or update a full profile.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the profile cannot be stored.
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError>;

    /// Fetch a profile by user id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_profile(&self, user_id: UserId) -> Result<Profile, StorageError>;

    /// Write the balance and daily counter after a finished game.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the profile does not exist.
    async fn update_after_game(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), StorageError>;
}

#[async_trait]
pub trait GameRepository: Send + Sync {
    /// Append a finished game to the history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn record_game(&self, game: NewGameRecord) -> Result<GameId, StorageError>;

    /// Most recent games of a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be read.
    async fn recent_games(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<GameRecord>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<BTreeMap<QuestionId, Question>>>,
    profiles: Arc<Mutex<HashMap<UserId, Profile>>>,
    games: Arc<Mutex<Vec<GameRecord>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn upsert_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        guard.insert(question.id(), question.clone());
        Ok(())
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.values().cloned().collect())
    }
}

#[async_trait]
impl ProfileRepository for InMemoryRepository {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        let mut guard = self.profiles.lock().map_err(poisoned)?;
        guard.insert(profile.id(), profile.clone());
        Ok(())
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Profile, StorageError> {
        let guard = self.profiles.lock().map_err(poisoned)?;
        guard.get(&user_id).cloned().ok_or(StorageError::NotFound)
    }

    async fn update_after_game(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<(), StorageError> {
        let mut guard = self.profiles.lock().map_err(poisoned)?;
        let profile = guard.get_mut(&user_id).ok_or(StorageError::NotFound)?;
        profile.apply(update);
        Ok(())
    }
}

#[async_trait]
impl GameRepository for InMemoryRepository {
    async fn record_game(&self, game: NewGameRecord) -> Result<GameId, StorageError> {
        let mut guard = self.games.lock().map_err(poisoned)?;
        let next = u64::try_from(guard.len() + 1)
            .map_err(|_| StorageError::Serialization("game id overflow".into()))?;
        let id = GameId::new(next);
        guard.push(GameRecord::from_persisted(
            id,
            game.user_id,
            game.score,
            game.gain,
            game.played_at,
        ));
        Ok(id)
    }

    async fn recent_games(
        &self,
        user_id: UserId,
        limit: u32,
    ) -> Result<Vec<GameRecord>, StorageError> {
        let guard = self.games.lock().map_err(poisoned)?;
        let mut games: Vec<GameRecord> = guard
            .iter()
            .filter(|g| g.user_id() == user_id)
            .cloned()
            .collect();
        games.sort_by(|a, b| {
            b.played_at()
                .cmp(&a.played_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        games.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(games)
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub games: Arc<dyn GameRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo.clone());
        let games: Arc<dyn GameRepository> = Arc::new(repo);
        Self {
            questions,
            profiles,
            games,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::model::ChoiceIndex;
    use quiz_core::time::fixed_now;

    fn build_question(id: u64) -> Question {
        Question::new(
            QuestionId::new(id),
            format!("Q{id}"),
            ["a".into(), "b".into(), "c".into(), "d".into()],
            ChoiceIndex::new(2).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn lists_questions_in_id_order() {
        let repo = InMemoryRepository::new();
        for id in [3, 1, 2] {
            repo.upsert_question(&build_question(id)).await.unwrap();
        }
        let ids: Vec<u64> = repo
            .list_questions()
            .await
            .unwrap()
            .iter()
            .map(|q| q.id().value())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn update_after_game_requires_profile() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let update = ProfileUpdate {
            balance: 10,
            games_played_today: 1,
            last_game_date: fixed_now().date_naive(),
        };
        let err = repo.update_after_game(user, &update).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));

        repo.upsert_profile(&Profile::new(user, "fatou", None).unwrap())
            .await
            .unwrap();
        repo.update_after_game(user, &update).await.unwrap();
        let profile = repo.get_profile(user).await.unwrap();
        assert_eq!(profile.balance(), 10);
        assert_eq!(profile.games_played_today(), 1);
    }

    #[tokio::test]
    async fn recent_games_are_newest_first_and_per_user() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let other = UserId::random();
        let now = fixed_now();

        for (i, who) in [(0, user), (1, other), (2, user), (3, user)] {
            repo.record_game(NewGameRecord {
                user_id: who,
                score: i,
                gain: i64::from(i) * 10,
                played_at: now + Duration::minutes(i64::from(i)),
            })
            .await
            .unwrap();
        }

        let games = repo.recent_games(user, 2).await.unwrap();
        let scores: Vec<u32> = games.iter().map(GameRecord::score).collect();
        assert_eq!(scores, vec![3, 2]);
    }
}
