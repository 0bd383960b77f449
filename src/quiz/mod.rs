pub mod answers;
pub mod questions;
pub mod session;

pub use answers::{AnswerError, AnswerSet, AnswerValue, Answers, LearningFormat};
pub use questions::{
    max_points, question, questions, PreferenceOption, Question, QuestionKind, ScoredOption,
    PREFERENCE_QUESTION_ID, SCORED_QUESTION_COUNT,
};
pub use session::{Advance, QuizSession};
