use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::QuizError;
use crate::model::ids::QuestionId;

/// Number of answer choices every question carries.
pub const CHOICES_PER_QUESTION: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("answer choice {0} cannot be empty")]
    EmptyChoice(u8),

    #[error("choice index must be between 1 and 4, got {0}")]
    InvalidChoiceIndex(i64),
}

//
// ─── CHOICE INDEX ──────────────────────────────────────────────────────────────
//

/// One-based position of an answer choice (1..=4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ChoiceIndex(u8);

impl ChoiceIndex {
    /// Creates a choice index.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError::InvalidChoiceIndex` unless `value` is in 1..=4.
    pub fn new(value: u8) -> Result<Self, QuestionError> {
        if (1..=4).contains(&value) {
            Ok(Self(value))
        } else {
            Err(QuestionError::InvalidChoiceIndex(i64::from(value)))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Zero-based slot into the choices array.
    #[must_use]
    pub fn slot(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// All four indices in display order.
    #[must_use]
    pub fn all() -> [ChoiceIndex; CHOICES_PER_QUESTION] {
        [Self(1), Self(2), Self(3), Self(4)]
    }
}

impl TryFrom<u8> for ChoiceIndex {
    type Error = QuestionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChoiceIndex> for u8 {
    fn from(value: ChoiceIndex) -> Self {
        value.0
    }
}

impl std::fmt::Display for ChoiceIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A multiple-choice question with exactly four choices and one correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    id: QuestionId,
    prompt: String,
    choices: [String; CHOICES_PER_QUESTION],
    correct: ChoiceIndex,
}

impl Question {
    /// Builds a question, trimming prompt and choices.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the prompt or any choice is blank.
    pub fn new(
        id: QuestionId,
        prompt: impl Into<String>,
        choices: [String; CHOICES_PER_QUESTION],
        correct: ChoiceIndex,
    ) -> Result<Self, QuestionError> {
        let prompt = prompt.into().trim().to_string();
        if prompt.is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let mut trimmed: [String; CHOICES_PER_QUESTION] = Default::default();
        for (slot, (choice, out)) in choices.into_iter().zip(trimmed.iter_mut()).enumerate() {
            let choice = choice.trim().to_string();
            if choice.is_empty() {
                let position = u8::try_from(slot + 1).unwrap_or(u8::MAX);
                return Err(QuestionError::EmptyChoice(position));
            }
            *out = choice;
        }

        Ok(Self {
            id,
            prompt,
            choices: trimmed,
            correct,
        })
    }

    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn choices(&self) -> &[String; CHOICES_PER_QUESTION] {
        &self.choices
    }

    #[must_use]
    pub fn choice(&self, index: ChoiceIndex) -> &str {
        &self.choices[index.slot()]
    }

    #[must_use]
    pub fn correct_choice(&self) -> ChoiceIndex {
        self.correct
    }

    #[must_use]
    pub fn is_correct(&self, choice: ChoiceIndex) -> bool {
        self.correct == choice
    }
}

//
// ─── QUESTION SET ──────────────────────────────────────────────────────────────
//

/// The ordered, fixed questions of one quiz attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Picks `count` distinct questions from `pool`, uniformly at random.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InsufficientQuestions` if the pool holds fewer than `count`.
    pub fn sample<R: Rng + ?Sized>(
        pool: &[Question],
        count: usize,
        rng: &mut R,
    ) -> Result<Self, QuizError> {
        if pool.len() < count {
            return Err(QuizError::InsufficientQuestions {
                available: pool.len(),
                required: count,
            });
        }

        let questions = index::sample(rng, pool.len(), count)
            .into_iter()
            .map(|i| pool[i].clone())
            .collect();
        Ok(Self { questions })
    }

    /// Uses `questions` as-is, in order, keeping only the first `count`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InsufficientQuestions` if fewer than `count` are given.
    pub fn ordered(mut questions: Vec<Question>, count: usize) -> Result<Self, QuizError> {
        if questions.len() < count {
            return Err(QuizError::InsufficientQuestions {
                available: questions.len(),
                required: count,
            });
        }
        questions.truncate(count);
        Ok(Self { questions })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    #[must_use]
    pub fn into_questions(self) -> Vec<Question> {
        self.questions
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
