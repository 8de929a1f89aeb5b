use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{GameId, Profile, ProfileUpdate, QuizOutcome, QuizRules, UserId};
use quiz_core::quiz::{QuizEngine, QuizEvent};
use storage::repository::{
    GameRepository, NewGameRecord, ProfileRepository, QuestionRepository, Storage,
};
use tracing::{error, info, warn};

use crate::auth::CurrentUser;
use crate::error::SessionError;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One quiz attempt for one user: the engine plus the context it was started with.
pub struct QuizSession {
    user_id: UserId,
    profile: Profile,
    engine: QuizEngine,
    opening_events: Vec<QuizEvent>,
}

impl QuizSession {
    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Profile as loaded at start, updated in place once the outcome is saved.
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    #[must_use]
    pub fn engine(&self) -> &QuizEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut QuizEngine {
        &mut self.engine
    }

    /// Events produced by starting the engine, handed out once.
    pub fn take_opening_events(&mut self) -> Vec<QuizEvent> {
        std::mem::take(&mut self.opening_events)
    }
}

//
// ─── FINISH REPORT ─────────────────────────────────────────────────────────────
//

/// Result of writing a finished quiz back to storage.
///
/// The profile update and the game record are two separate writes. A failure on
/// the second leaves the balance updated without a history entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    Saved { game_id: GameId },
    ProfileFailed { reason: String },
    RecordFailed { reason: String },
}

impl PersistenceStatus {
    #[must_use]
    pub fn is_saved(&self) -> bool {
        matches!(self, Self::Saved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishReport {
    pub outcome: QuizOutcome,
    pub update: ProfileUpdate,
    pub persistence: PersistenceStatus,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Starts quiz sessions and persists their outcome.
#[derive(Clone)]
pub struct QuizSessionService {
    clock: Clock,
    rules: QuizRules,
    auth: Arc<dyn CurrentUser>,
    questions: Arc<dyn QuestionRepository>,
    profiles: Arc<dyn ProfileRepository>,
    games: Arc<dyn GameRepository>,
}

impl QuizSessionService {
    #[must_use]
    pub fn new(
        clock: Clock,
        rules: QuizRules,
        auth: Arc<dyn CurrentUser>,
        questions: Arc<dyn QuestionRepository>,
        profiles: Arc<dyn ProfileRepository>,
        games: Arc<dyn GameRepository>,
    ) -> Self {
        Self {
            clock,
            rules,
            auth,
            questions,
            profiles,
            games,
        }
    }

    #[must_use]
    pub fn from_storage(
        clock: Clock,
        rules: QuizRules,
        auth: Arc<dyn CurrentUser>,
        storage: &Storage,
    ) -> Self {
        Self::new(
            clock,
            rules,
            auth,
            Arc::clone(&storage.questions),
            Arc::clone(&storage.profiles),
            Arc::clone(&storage.games),
        )
    }

    /// Start a quiz for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Unauthenticated` without a user,
    /// `SessionError::Quiz` when the daily limit is reached or the pool is too small,
    /// and `SessionError::Storage` when a collaborator fails.
    pub async fn begin(&self) -> Result<QuizSession, SessionError> {
        let user_id = self
            .auth
            .current_user()
            .await
            .ok_or(SessionError::Unauthenticated)?;

        let profile = self.profiles.get_profile(user_id).await?;
        let played = profile.games_played_on(self.clock.today());

        let mut engine = QuizEngine::new(self.rules.clone());
        if let Err(e) = engine.ensure_can_start(played) {
            info!(user = %user_id, played, "quiz refused: {e}");
            return Err(e.into());
        }

        let pool = self.questions.list_questions().await?;
        let opening_events = {
            let mut rng = rand::rng();
            engine.start(&pool, played, &mut rng).inspect_err(|e| {
                warn!(user = %user_id, pool = pool.len(), "quiz refused: {e}");
            })?
        };

        info!(user = %user_id, played, "quiz started");
        Ok(QuizSession {
            user_id,
            profile,
            engine,
            opening_events,
        })
    }

    /// Persist the outcome of a finished session.
    ///
    /// Writes the new balance and daily counter, then appends the game to the
    /// history. Write failures are logged and reported in the returned
    /// `FinishReport`; they are not retried and not returned as errors.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotFinished` if the engine has not reached `Finished`.
    pub async fn finish(&self, session: &mut QuizSession) -> Result<FinishReport, SessionError> {
        let outcome = session.engine.outcome().ok_or(SessionError::NotFinished)?;
        let played_at = self.clock.now();
        let update = session.profile.update_for(&outcome, self.clock.today());
        let user_id = session.user_id;

        if let Err(e) = self.profiles.update_after_game(user_id, &update).await {
            error!(user = %user_id, "failed to save profile after quiz: {e}");
            return Ok(FinishReport {
                outcome,
                update,
                persistence: PersistenceStatus::ProfileFailed {
                    reason: e.to_string(),
                },
            });
        }
        session.profile.apply(&update);

        let record = NewGameRecord::from_outcome(user_id, &outcome, played_at);
        let persistence = match self.games.record_game(record).await {
            Ok(game_id) => {
                info!(
                    user = %user_id,
                    score = outcome.score(),
                    gain = outcome.gain(),
                    game = %game_id,
                    "quiz saved"
                );
                PersistenceStatus::Saved { game_id }
            }
            Err(e) => {
                error!(user = %user_id, "failed to record game, balance already updated: {e}");
                PersistenceStatus::RecordFailed {
                    reason: e.to_string(),
                }
            }
        };

        Ok(FinishReport {
            outcome,
            update,
            persistence,
        })
    }
}
