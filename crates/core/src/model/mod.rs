mod game;
mod ids;
mod profile;
mod question;
mod rules;

pub use ids::{GameId, ParseIdError, QuestionId, UserId};

pub use game::{GameRecord, QuizOutcome};
pub use profile::{MIN_PSEUDO_LEN, Profile, ProfileError, ProfileUpdate};
pub use question::{CHOICES_PER_QUESTION, ChoiceIndex, Question, QuestionError, QuestionSet};
pub use rules::{QuizRules, RulesError};
