use std::time::Duration;

use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RulesError {
    #[error("questions per quiz must be > 0")]
    InvalidQuestionsPerQuiz,

    #[error("seconds per question must be > 0")]
    InvalidSecondsPerQuestion,

    #[error("daily limit must be > 0")]
    InvalidDailyLimit,

    #[error("timer thresholds must satisfy danger <= warning <= seconds per question")]
    InvalidThresholds,
}

//
// ─── RULES ─────────────────────────────────────────────────────────────────────
//

/// Tunable constants of a quiz attempt.
///
/// Defaults match the production game:
/// - 10 questions per quiz
/// - 20 seconds to answer each question
/// - 10 FCFA per correct answer
/// - 5 games per calendar day
/// - 1.5s of feedback before the next question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizRules {
    questions_per_quiz: usize,
    seconds_per_question: u32,
    reward_per_correct: u32,
    daily_limit: u32,
    feedback_delay: Duration,
    warning_at: u32,
    danger_at: u32,
}

impl QuizRules {
    /// Creates custom rules.
    ///
    /// # Errors
    ///
    /// Returns `RulesError` if a count is zero or the timer thresholds are out of order.
    pub fn new(
        questions_per_quiz: usize,
        seconds_per_question: u32,
        reward_per_correct: u32,
        daily_limit: u32,
        feedback_delay: Duration,
        warning_at: u32,
        danger_at: u32,
    ) -> Result<Self, RulesError> {
        if questions_per_quiz == 0 {
            return Err(RulesError::InvalidQuestionsPerQuiz);
        }
        if seconds_per_question == 0 {
            return Err(RulesError::InvalidSecondsPerQuestion);
        }
        if daily_limit == 0 {
            return Err(RulesError::InvalidDailyLimit);
        }
        if danger_at > warning_at || warning_at > seconds_per_question {
            return Err(RulesError::InvalidThresholds);
        }

        Ok(Self {
            questions_per_quiz,
            seconds_per_question,
            reward_per_correct,
            daily_limit,
            feedback_delay,
            warning_at,
            danger_at,
        })
    }

    #[must_use]
    pub fn questions_per_quiz(&self) -> usize {
        self.questions_per_quiz
    }

    #[must_use]
    pub fn seconds_per_question(&self) -> u32 {
        self.seconds_per_question
    }

    #[must_use]
    pub fn reward_per_correct(&self) -> u32 {
        self.reward_per_correct
    }

    #[must_use]
    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    #[must_use]
    pub fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }

    #[must_use]
    pub fn warning_at(&self) -> u32 {
        self.warning_at
    }

    #[must_use]
    pub fn danger_at(&self) -> u32 {
        self.danger_at
    }

    /// Gain earned for `score` correct answers.
    #[must_use]
    pub fn gain_for(&self, score: u32) -> i64 {
        i64::from(score) * i64::from(self.reward_per_correct)
    }
}

impl Default for QuizRules {
    fn default() -> Self {
        Self {
            questions_per_quiz: 10,
            seconds_per_question: 20,
            reward_per_correct: 10,
            daily_limit: 5,
            feedback_delay: Duration::from_millis(1500),
            warning_at: 10,
            danger_at: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_game_constants() {
        let rules = QuizRules::default();
        assert_eq!(rules.questions_per_quiz(), 10);
        assert_eq!(rules.seconds_per_question(), 20);
        assert_eq!(rules.daily_limit(), 5);
        assert_eq!(rules.gain_for(7), 70);
    }

    #[test]
    fn rejects_thresholds_out_of_order() {
        let err = QuizRules::new(10, 20, 10, 5, Duration::from_millis(1500), 4, 5).unwrap_err();
        assert_eq!(err, RulesError::InvalidThresholds);

        let err = QuizRules::new(10, 8, 10, 5, Duration::from_millis(1500), 10, 5).unwrap_err();
        assert_eq!(err, RulesError::InvalidThresholds);
    }

    #[test]
    fn rejects_zero_counts() {
        assert_eq!(
            QuizRules::new(0, 20, 10, 5, Duration::ZERO, 10, 5).unwrap_err(),
            RulesError::InvalidQuestionsPerQuiz
        );
        assert_eq!(
            QuizRules::new(10, 0, 10, 5, Duration::ZERO, 0, 0).unwrap_err(),
            RulesError::InvalidSecondsPerQuestion
        );
        assert_eq!(
            QuizRules::new(10, 20, 10, 0, Duration::ZERO, 10, 5).unwrap_err(),
            RulesError::InvalidDailyLimit
        );
    }
}
