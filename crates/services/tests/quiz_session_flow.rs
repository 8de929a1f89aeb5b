use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use quiz_core::QuizError;
use quiz_core::model::{
    ChoiceIndex, GameId, GameRecord, Profile, ProfileUpdate, Question, QuestionId, QuizRules,
    UserId,
};
use quiz_core::time::fixed_now;
use services::{
    Clock, PersistenceStatus, QuizSession, QuizSessionService, SessionError, StaticUser,
};
use storage::repository::{
    GameRepository, InMemoryRepository, NewGameRecord, ProfileRepository, QuestionRepository,
    Storage, StorageError,
};

fn question(id: u64) -> Question {
    Question::new(
        QuestionId::new(id),
        format!("Question {id}?"),
        ["one".into(), "two".into(), "three".into(), "four".into()],
        ChoiceIndex::new(u8::try_from(id % 4).unwrap() + 1).unwrap(),
    )
    .unwrap()
}

async fn seeded_repo(pool_size: u64, profile: &Profile) -> InMemoryRepository {
    let repo = InMemoryRepository::new();
    for id in 1..=pool_size {
        repo.upsert_question(&question(id)).await.unwrap();
    }
    repo.upsert_profile(profile).await.unwrap();
    repo
}

fn service_over(repo: &InMemoryRepository, user: Option<UserId>) -> QuizSessionService {
    let auth = match user {
        Some(id) => StaticUser::signed_in(id),
        None => StaticUser::anonymous(),
    };
    QuizSessionService::new(
        Clock::fixed(fixed_now()),
        QuizRules::default(),
        Arc::new(auth),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
}

/// Answer the first `correct` questions right and the rest wrong.
fn play_through(session: &mut QuizSession, correct: usize) {
    let engine = session.engine_mut();
    let mut index = 0;
    while !engine.is_finished() {
        let right = engine.current_question().unwrap().correct_choice();
        let choice = if index < correct {
            right
        } else {
            ChoiceIndex::all().into_iter().find(|c| *c != right).unwrap()
        };
        assert!(!engine.submit_answer(choice).is_empty());
        engine.advance();
        index += 1;
    }
}

#[tokio::test]
async fn finished_quiz_updates_balance_and_history() {
    let user = UserId::random();
    let profile = Profile::from_persisted(user, "awa", None, 20, 0, None).unwrap();
    let repo = seeded_repo(15, &profile).await;
    let service = service_over(&repo, Some(user));

    let mut session = service.begin().await.unwrap();
    assert_eq!(session.engine().total_questions(), 10);
    assert_eq!(session.take_opening_events().len(), 1);
    assert!(session.take_opening_events().is_empty());

    play_through(&mut session, 7);
    let report = service.finish(&mut session).await.unwrap();

    assert_eq!(report.outcome.score(), 7);
    assert_eq!(report.outcome.gain(), 70);
    assert_eq!(report.persistence, PersistenceStatus::Saved {
        game_id: GameId::new(1)
    });

    let stored = repo.get_profile(user).await.unwrap();
    assert_eq!(stored.balance(), 90);
    assert_eq!(stored.games_played_today(), 1);
    assert_eq!(stored.last_game_date(), Some(fixed_now().date_naive()));
    assert_eq!(session.profile(), &stored);

    let history = repo.recent_games(user, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score(), 7);
    assert_eq!(history[0].gain(), 70);
    assert_eq!(history[0].played_at(), fixed_now());
}

#[tokio::test]
async fn service_runs_over_the_storage_aggregate() {
    let storage = Storage::in_memory();
    for id in 1..=10 {
        storage.questions.upsert_question(&question(id)).await.unwrap();
    }
    let user = UserId::random();
    storage
        .profiles
        .upsert_profile(&Profile::new(user, "daouda", None).unwrap())
        .await
        .unwrap();

    let service = QuizSessionService::from_storage(
        Clock::fixed(fixed_now()),
        QuizRules::default(),
        Arc::new(StaticUser::signed_in(user)),
        &storage,
    );
    let mut session = service.begin().await.unwrap();
    play_through(&mut session, 4);
    let report = service.finish(&mut session).await.unwrap();

    assert!(report.persistence.is_saved());
    assert_eq!(storage.profiles.get_profile(user).await.unwrap().balance(), 40);
    let history = storage.games.recent_games(user, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].score(), 4);
}

#[tokio::test]
async fn begin_requires_signed_in_user() {
    let profile = Profile::new(UserId::random(), "ousmane", None).unwrap();
    let repo = seeded_repo(10, &profile).await;
    let err = service_over(&repo, None).begin().await.err().unwrap();
    assert!(matches!(err, SessionError::Unauthenticated));
}

#[tokio::test]
async fn begin_fails_for_missing_profile() {
    let profile = Profile::new(UserId::random(), "ousmane", None).unwrap();
    let repo = seeded_repo(10, &profile).await;
    let err = service_over(&repo, Some(UserId::random()))
        .begin()
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SessionError::Storage(StorageError::NotFound)));
}

#[tokio::test]
async fn daily_limit_blocks_sixth_game_today() {
    let user = UserId::random();
    let today = fixed_now().date_naive();
    let profile = Profile::from_persisted(user, "khady", None, 0, 5, Some(today)).unwrap();
    let repo = seeded_repo(10, &profile).await;

    let err = service_over(&repo, Some(user)).begin().await.err().unwrap();
    assert!(matches!(
        err,
        SessionError::Quiz(QuizError::DailyLimitReached { played: 5, limit: 5 })
    ));
}

#[tokio::test]
async fn counter_resets_on_a_new_day() {
    let user = UserId::random();
    let yesterday = (fixed_now() - Duration::days(1)).date_naive();
    let profile = Profile::from_persisted(user, "khady", None, 40, 5, Some(yesterday)).unwrap();
    let repo = seeded_repo(10, &profile).await;
    let service = service_over(&repo, Some(user));

    let mut session = service.begin().await.unwrap();
    play_through(&mut session, 0);
    let report = service.finish(&mut session).await.unwrap();

    assert_eq!(report.update.games_played_today, 1);
    assert_eq!(report.update.balance, 40);
    assert_eq!(repo.get_profile(user).await.unwrap().games_played_today(), 1);
}

#[tokio::test]
async fn small_pool_is_rejected() {
    let user = UserId::random();
    let profile = Profile::new(user, "modou", None).unwrap();
    let repo = seeded_repo(9, &profile).await;

    let err = service_over(&repo, Some(user)).begin().await.err().unwrap();
    assert!(matches!(
        err,
        SessionError::Quiz(QuizError::InsufficientQuestions {
            available: 9,
            required: 10
        })
    ));
}

#[tokio::test]
async fn finish_before_the_end_is_refused() {
    let user = UserId::random();
    let profile = Profile::new(user, "modou", None).unwrap();
    let repo = seeded_repo(10, &profile).await;
    let service = service_over(&repo, Some(user));

    let mut session = service.begin().await.unwrap();
    let err = service.finish(&mut session).await.unwrap_err();
    assert!(matches!(err, SessionError::NotFinished));
    assert!(repo.recent_games(user, 10).await.unwrap().is_empty());
}

struct FailingProfiles {
    inner: InMemoryRepository,
}

#[async_trait]
impl ProfileRepository for FailingProfiles {
    async fn upsert_profile(&self, profile: &Profile) -> Result<(), StorageError> {
        self.inner.upsert_profile(profile).await
    }

    async fn get_profile(&self, user_id: UserId) -> Result<Profile, StorageError> {
        self.inner.get_profile(user_id).await
    }

    async fn update_after_game(
        &self,
        _user_id: UserId,
        _update: &ProfileUpdate,
    ) -> Result<(), StorageError> {
        Err(StorageError::Connection("database is locked".into()))
    }
}

struct FailingGames;

#[async_trait]
impl GameRepository for FailingGames {
    async fn record_game(&self, _game: NewGameRecord) -> Result<GameId, StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }

    async fn recent_games(
        &self,
        _user_id: UserId,
        _limit: u32,
    ) -> Result<Vec<GameRecord>, StorageError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn profile_write_failure_skips_game_record() {
    let user = UserId::random();
    let profile = Profile::from_persisted(user, "bineta", None, 10, 0, None).unwrap();
    let repo = seeded_repo(10, &profile).await;
    let service = QuizSessionService::new(
        Clock::fixed(fixed_now()),
        QuizRules::default(),
        Arc::new(StaticUser::signed_in(user)),
        Arc::new(repo.clone()),
        Arc::new(FailingProfiles {
            inner: repo.clone(),
        }),
        Arc::new(repo.clone()),
    );

    let mut session = service.begin().await.unwrap();
    play_through(&mut session, 3);
    let report = service.finish(&mut session).await.unwrap();

    assert!(matches!(
        report.persistence,
        PersistenceStatus::ProfileFailed { .. }
    ));
    assert_eq!(report.outcome.gain(), 30);
    assert_eq!(repo.get_profile(user).await.unwrap().balance(), 10);
    assert_eq!(session.profile().balance(), 10);
    assert!(repo.recent_games(user, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn record_failure_keeps_balance_update() {
    let user = UserId::random();
    let profile = Profile::from_persisted(user, "bineta", None, 10, 0, None).unwrap();
    let repo = seeded_repo(10, &profile).await;
    let service = QuizSessionService::new(
        Clock::fixed(fixed_now()),
        QuizRules::default(),
        Arc::new(StaticUser::signed_in(user)),
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
        Arc::new(FailingGames),
    );

    let mut session = service.begin().await.unwrap();
    play_through(&mut session, 10);
    let report = service.finish(&mut session).await.unwrap();

    assert!(matches!(
        report.persistence,
        PersistenceStatus::RecordFailed { .. }
    ));
    assert!(!report.persistence.is_saved());
    assert_eq!(repo.get_profile(user).await.unwrap().balance(), 110);
}
