//! Timed multiple-choice quiz state machine.
//!
//! One `QuizEngine` owns one attempt: `Idle` until started, then alternating
//! between `AwaitingAnswer` (countdown running) and `Resolved` (answer locked,
//! feedback showing) until every question is done and it reaches `Finished`.
//!
//! Each transition returns the events it produced. An empty list means the call
//! was a no-op, e.g. a second answer to an already resolved question.

use rand::Rng;
use serde::Serialize;

use crate::error::QuizError;
use crate::model::{ChoiceIndex, Question, QuestionSet, QuizOutcome, QuizRules};

//
// ─── STATES & EVENTS ───────────────────────────────────────────────────────────
//

/// How a question was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Correct,
    Incorrect { chosen: ChoiceIndex },
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    AwaitingAnswer { index: usize },
    Resolved { index: usize, resolution: Resolution },
    Finished,
}

/// How close the countdown is to running out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerUrgency {
    Calm,
    Warning,
    Danger,
}

/// State changes published to whoever presents the quiz.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum QuizEvent {
    QuestionChanged {
        index: usize,
        total: usize,
        question: Question,
        seconds_left: u32,
    },
    TimerTicked {
        seconds_left: u32,
        urgency: TimerUrgency,
    },
    AnswerResolved {
        index: usize,
        chosen: ChoiceIndex,
        correct_choice: ChoiceIndex,
        correct: bool,
        score: u32,
    },
    TimedOut {
        index: usize,
        correct_choice: ChoiceIndex,
    },
    SessionFinished {
        score: u32,
        total: usize,
        gain: i64,
    },
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone)]
pub struct QuizEngine {
    rules: QuizRules,
    questions: Vec<Question>,
    phase: QuizPhase,
    score: u32,
    seconds_left: u32,
    answering_locked: bool,
}

impl QuizEngine {
    #[must_use]
    pub fn new(rules: QuizRules) -> Self {
        let seconds_left = rules.seconds_per_question();
        Self {
            rules,
            questions: Vec::new(),
            phase: QuizPhase::Idle,
            score: 0,
            seconds_left,
            answering_locked: false,
        }
    }

    /// Sample a question set from `pool` and activate the first question.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::DailyLimitReached` if `games_played_today` is at the limit,
    /// `QuizError::InsufficientQuestions` if the pool is too small, and
    /// `QuizError::AlreadyStarted` outside `Idle`. The engine stays `Idle` on error.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        pool: &[Question],
        games_played_today: u32,
        rng: &mut R,
    ) -> Result<Vec<QuizEvent>, QuizError> {
        self.ensure_can_start(games_played_today)?;
        let set = QuestionSet::sample(pool, self.rules.questions_per_quiz(), rng)?;
        self.start_with(set, games_played_today)
    }

    /// Activate the first question of an already chosen set.
    ///
    /// # Errors
    ///
    /// Same as [`QuizEngine::start`].
    pub fn start_with(
        &mut self,
        set: QuestionSet,
        games_played_today: u32,
    ) -> Result<Vec<QuizEvent>, QuizError> {
        self.ensure_can_start(games_played_today)?;
        let set = QuestionSet::ordered(set.into_questions(), self.rules.questions_per_quiz())?;

        self.questions = set.into_questions();
        self.score = 0;
        Ok(vec![self.activate(0)])
    }

    /// Check the start preconditions that do not depend on the question pool.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::AlreadyStarted` outside `Idle` and
    /// `QuizError::DailyLimitReached` once `games_played_today` hits the limit.
    pub fn ensure_can_start(&self, games_played_today: u32) -> Result<(), QuizError> {
        if self.phase != QuizPhase::Idle {
            return Err(QuizError::AlreadyStarted);
        }
        if games_played_today >= self.rules.daily_limit() {
            return Err(QuizError::DailyLimitReached {
                played: games_played_today,
                limit: self.rules.daily_limit(),
            });
        }
        Ok(())
    }

    /// One second elapsed on the active question's countdown.
    pub fn tick(&mut self) -> Vec<QuizEvent> {
        let QuizPhase::AwaitingAnswer { index } = self.phase else {
            return Vec::new();
        };
        if self.answering_locked {
            return Vec::new();
        }

        self.seconds_left = self.seconds_left.saturating_sub(1);
        let mut events = vec![QuizEvent::TimerTicked {
            seconds_left: self.seconds_left,
            urgency: self.urgency(),
        }];

        if self.seconds_left == 0 {
            self.answering_locked = true;
            self.phase = QuizPhase::Resolved {
                index,
                resolution: Resolution::TimedOut,
            };
            events.push(QuizEvent::TimedOut {
                index,
                correct_choice: self.questions[index].correct_choice(),
            });
        }
        events
    }

    /// Lock in `choice` for the active question. Only the first resolution counts.
    pub fn submit_answer(&mut self, choice: ChoiceIndex) -> Vec<QuizEvent> {
        let QuizPhase::AwaitingAnswer { index } = self.phase else {
            return Vec::new();
        };
        if self.answering_locked {
            return Vec::new();
        }
        self.answering_locked = true;

        let question = &self.questions[index];
        let correct = question.is_correct(choice);
        let correct_choice = question.correct_choice();
        let resolution = if correct {
            self.score += 1;
            Resolution::Correct
        } else {
            Resolution::Incorrect { chosen: choice }
        };
        self.phase = QuizPhase::Resolved { index, resolution };

        vec![QuizEvent::AnswerResolved {
            index,
            chosen: choice,
            correct_choice,
            correct,
            score: self.score,
        }]
    }

    /// Move past a resolved question, either to the next one or to `Finished`.
    pub fn advance(&mut self) -> Vec<QuizEvent> {
        let QuizPhase::Resolved { index, .. } = self.phase else {
            return Vec::new();
        };

        let next = index + 1;
        if next < self.questions.len() {
            return vec![self.activate(next)];
        }

        self.phase = QuizPhase::Finished;
        vec![QuizEvent::SessionFinished {
            score: self.score,
            total: self.questions.len(),
            gain: self.rules.gain_for(self.score),
        }]
    }

    fn activate(&mut self, index: usize) -> QuizEvent {
        self.phase = QuizPhase::AwaitingAnswer { index };
        self.seconds_left = self.rules.seconds_per_question();
        self.answering_locked = false;
        QuizEvent::QuestionChanged {
            index,
            total: self.questions.len(),
            question: self.questions[index].clone(),
            seconds_left: self.seconds_left,
        }
    }

    fn urgency(&self) -> TimerUrgency {
        if self.seconds_left <= self.rules.danger_at() {
            TimerUrgency::Danger
        } else if self.seconds_left <= self.rules.warning_at() {
            TimerUrgency::Warning
        } else {
            TimerUrgency::Calm
        }
    }

    /// Final score and gain, available once `Finished`.
    #[must_use]
    pub fn outcome(&self) -> Option<QuizOutcome> {
        if self.phase != QuizPhase::Finished {
            return None;
        }
        let total = u32::try_from(self.questions.len()).unwrap_or(u32::MAX);
        Some(QuizOutcome::new(
            self.score,
            total,
            self.rules.gain_for(self.score),
        ))
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    #[must_use]
    pub fn rules(&self) -> &QuizRules {
        &self.rules
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn seconds_left(&self) -> u32 {
        self.seconds_left
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// Index of the question being asked or showing feedback.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        match self.phase {
            QuizPhase::AwaitingAnswer { index } | QuizPhase::Resolved { index, .. } => Some(index),
            QuizPhase::Idle | QuizPhase::Finished => None,
        }
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current_index().and_then(|i| self.questions.get(i))
    }

    #[must_use]
    pub fn is_awaiting_answer(&self) -> bool {
        matches!(self.phase, QuizPhase::AwaitingAnswer { .. }) && !self.answering_locked
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase == QuizPhase::Finished
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::QuestionId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn choice(v: u8) -> ChoiceIndex {
        ChoiceIndex::new(v).unwrap()
    }

    /// Question `id` has its correct answer at choice `(id % 4) + 1`.
    fn pool(n: u64) -> Vec<Question> {
        (1..=n)
            .map(|id| {
                let correct = u8::try_from(id % 4).unwrap() + 1;
                Question::new(
                    QuestionId::new(id),
                    format!("Question {id}"),
                    ["A".into(), "B".into(), "C".into(), "D".into()],
                    choice(correct),
                )
                .unwrap()
            })
            .collect()
    }

    fn started() -> QuizEngine {
        let mut engine = QuizEngine::new(QuizRules::default());
        let set = QuestionSet::ordered(pool(10), 10).unwrap();
        engine.start_with(set, 0).unwrap();
        engine
    }

    fn correct_now(engine: &QuizEngine) -> ChoiceIndex {
        engine.current_question().unwrap().correct_choice()
    }

    fn wrong_now(engine: &QuizEngine) -> ChoiceIndex {
        let correct = correct_now(engine).value();
        choice(if correct == 4 { 1 } else { correct + 1 })
    }

    #[test]
    fn start_activates_first_question() {
        let mut engine = QuizEngine::new(QuizRules::default());
        let mut rng = StdRng::seed_from_u64(1);
        let events = engine.start(&pool(30), 0, &mut rng).unwrap();

        assert_eq!(engine.phase(), QuizPhase::AwaitingAnswer { index: 0 });
        assert_eq!(engine.total_questions(), 10);
        assert_eq!(engine.seconds_left(), 20);
        assert!(matches!(
            events.as_slice(),
            [QuizEvent::QuestionChanged { index: 0, total: 10, seconds_left: 20, .. }]
        ));
    }

    #[test]
    fn start_with_small_pool_stays_idle() {
        let mut engine = QuizEngine::new(QuizRules::default());
        let mut rng = StdRng::seed_from_u64(1);
        let err = engine.start(&pool(9), 0, &mut rng).unwrap_err();

        assert_eq!(
            err,
            QuizError::InsufficientQuestions {
                available: 9,
                required: 10
            }
        );
        assert_eq!(engine.phase(), QuizPhase::Idle);
    }

    #[test]
    fn start_refuses_at_daily_limit() {
        let mut engine = QuizEngine::new(QuizRules::default());
        let mut rng = StdRng::seed_from_u64(1);
        let err = engine.start(&pool(20), 5, &mut rng).unwrap_err();

        assert_eq!(err, QuizError::DailyLimitReached { played: 5, limit: 5 });
        assert_eq!(engine.phase(), QuizPhase::Idle);
        assert!(engine.start(&pool(20), 4, &mut rng).is_ok());
    }

    #[test]
    fn start_twice_is_rejected() {
        let mut engine = started();
        let set = QuestionSet::ordered(pool(10), 10).unwrap();
        assert_eq!(engine.start_with(set, 0).unwrap_err(), QuizError::AlreadyStarted);
    }

    #[test]
    fn second_answer_is_ignored() {
        let mut engine = started();
        let right = correct_now(&engine);
        let wrong = wrong_now(&engine);

        let first = engine.submit_answer(wrong);
        assert!(matches!(
            first.as_slice(),
            [QuizEvent::AnswerResolved { correct: false, score: 0, .. }]
        ));

        assert!(engine.submit_answer(right).is_empty());
        assert_eq!(engine.score(), 0);
        assert!(matches!(
            engine.phase(),
            QuizPhase::Resolved {
                index: 0,
                resolution: Resolution::Incorrect { .. }
            }
        ));
    }

    #[test]
    fn countdown_times_out_exactly_once() {
        let mut engine = started();
        let mut timeouts = 0;
        for _ in 0..20 {
            for event in engine.tick() {
                if matches!(event, QuizEvent::TimedOut { index: 0, .. }) {
                    timeouts += 1;
                }
            }
        }
        assert_eq!(timeouts, 1);
        assert_eq!(engine.score(), 0);
        assert_eq!(
            engine.phase(),
            QuizPhase::Resolved {
                index: 0,
                resolution: Resolution::TimedOut
            }
        );

        for _ in 0..5 {
            assert!(engine.tick().is_empty());
        }
        assert!(engine.submit_answer(choice(1)).is_empty());
    }

    #[test]
    fn answer_after_timeout_is_ignored() {
        let mut engine = started();
        for _ in 0..20 {
            engine.tick();
        }
        let right = correct_now(&engine);
        assert!(engine.submit_answer(right).is_empty());
        assert_eq!(engine.score(), 0);
    }

    #[test]
    fn ticks_report_urgency() {
        let mut engine = started();
        let mut urgencies = Vec::new();
        for _ in 0..19 {
            for event in engine.tick() {
                if let QuizEvent::TimerTicked { seconds_left, urgency } = event {
                    urgencies.push((seconds_left, urgency));
                }
            }
        }
        assert_eq!(urgencies[0], (19, TimerUrgency::Calm));
        assert_eq!(urgencies[9], (10, TimerUrgency::Warning));
        assert_eq!(urgencies[14], (5, TimerUrgency::Danger));
    }

    #[test]
    fn advance_resets_countdown() {
        let mut engine = started();
        for _ in 0..7 {
            engine.tick();
        }
        assert_eq!(engine.seconds_left(), 13);

        let right = correct_now(&engine);
        engine.submit_answer(right);
        assert!(engine.tick().is_empty());
        assert_eq!(engine.seconds_left(), 13);

        let events = engine.advance();
        assert!(matches!(
            events.as_slice(),
            [QuizEvent::QuestionChanged { index: 1, seconds_left: 20, .. }]
        ));
        assert_eq!(engine.seconds_left(), 20);
        assert!(engine.is_awaiting_answer());
    }

    #[test]
    fn advance_is_noop_while_awaiting_answer() {
        let mut engine = started();
        assert!(engine.advance().is_empty());
        assert_eq!(engine.phase(), QuizPhase::AwaitingAnswer { index: 0 });
    }

    #[test]
    fn seven_correct_answers_earn_seventy() {
        let mut engine = started();
        for i in 0..10 {
            if i < 7 {
                let right = correct_now(&engine);
                engine.submit_answer(right);
            } else if i < 9 {
                let wrong = wrong_now(&engine);
                engine.submit_answer(wrong);
            } else {
                for _ in 0..20 {
                    engine.tick();
                }
            }
            let events = engine.advance();
            if i == 9 {
                assert_eq!(
                    events,
                    vec![QuizEvent::SessionFinished {
                        score: 7,
                        total: 10,
                        gain: 70
                    }]
                );
            }
        }

        assert!(engine.is_finished());
        let outcome = engine.outcome().unwrap();
        assert_eq!(outcome.score(), 7);
        assert_eq!(outcome.gain(), 70);
    }

    #[test]
    fn random_play_always_finishes_within_bounds() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut engine = QuizEngine::new(QuizRules::default());
            engine.start(&pool(40), 0, &mut rng).unwrap();

            while !engine.is_finished() {
                if rng.random_bool(0.3) {
                    while engine.is_awaiting_answer() {
                        engine.tick();
                    }
                } else {
                    let pick = rng.random_range(1..=4u8);
                    engine.submit_answer(choice(pick));
                }
                engine.advance();
            }

            let outcome = engine.outcome().unwrap();
            assert!(outcome.score() <= 10);
            assert_eq!(outcome.gain(), i64::from(outcome.score()) * 10);
            assert!(engine.tick().is_empty());
            assert!(engine.advance().is_empty());
        }
    }

    #[test]
    fn outcome_is_absent_before_finish() {
        let engine = started();
        assert!(engine.outcome().is_none());
    }
}
