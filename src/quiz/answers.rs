use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::questions::{self, PREFERENCE_QUESTION_ID, SCORED_QUESTION_COUNT};

/// Content format a respondent prefers (the unscored q10)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningFormat {
    Lessons,
    Articles,
    Stories,
    Debates,
    Conversations,
}

impl LearningFormat {
    pub const ALL: [LearningFormat; 5] = [
        LearningFormat::Lessons,
        LearningFormat::Articles,
        LearningFormat::Stories,
        LearningFormat::Debates,
        LearningFormat::Conversations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LearningFormat::Lessons => "lessons",
            LearningFormat::Articles => "articles",
            LearningFormat::Stories => "stories",
            LearningFormat::Debates => "debates",
            LearningFormat::Conversations => "conversations",
        }
    }
}

impl fmt::Display for LearningFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LearningFormat {
    type Err = AnswerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LearningFormat::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AnswerError::UnknownFormat(s.to_string()))
    }
}

/// A single recorded answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Points(u8),
    Format(LearningFormat),
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Points(points) => write!(f, "{}", points),
            AnswerValue::Format(format) => write!(f, "{}", format),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("unknown question '{0}'")]
    UnknownQuestion(String),

    #[error("{id}: '{value}' is not one of the offered options")]
    OutOfDomain { id: String, value: String },

    #[error("unanswered: {}", .ids.join(", "))]
    Missing { ids: Vec<String> },

    #[error("unknown learning format '{0}'")]
    UnknownFormat(String),
}

/// A complete, in-domain answer set.
///
/// Constructing one validates every answer against the questionnaire, so a
/// value of this type always satisfies the scoring engine's precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "AnswersDocument", into = "AnswersDocument")]
pub struct Answers {
    scored: [u8; SCORED_QUESTION_COUNT],
    preference: LearningFormat,
}

impl Answers {
    pub fn new(
        scored: [u8; SCORED_QUESTION_COUNT],
        preference: LearningFormat,
    ) -> Result<Self, AnswerError> {
        for (question, &value) in questions::questions().iter().zip(scored.iter()) {
            if !question.accepts(&AnswerValue::Points(value)) {
                return Err(AnswerError::OutOfDomain {
                    id: question.id.to_string(),
                    value: value.to_string(),
                });
            }
        }
        Ok(Self { scored, preference })
    }

    /// Values of q1..q9 in order
    pub fn scored_values(&self) -> &[u8; SCORED_QUESTION_COUNT] {
        &self.scored
    }

    pub fn preference(&self) -> LearningFormat {
        self.preference
    }

    /// Answer for a question id
    pub fn get(&self, id: &str) -> Option<AnswerValue> {
        if id == PREFERENCE_QUESTION_ID {
            return Some(AnswerValue::Format(self.preference));
        }
        questions::position(id)
            .and_then(|i| self.scored.get(i))
            .map(|&v| AnswerValue::Points(v))
    }

    /// (question id, value) pairs in questionnaire order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, AnswerValue)> + '_ {
        questions::questions()
            .iter()
            .filter_map(move |q| self.get(q.id).map(|v| (q.id, v)))
    }
}

/// Flat wire shape: `{"q1": 3, ..., "q9": 2, "q10": "lessons"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnswersDocument {
    q1: u8,
    q2: u8,
    q3: u8,
    q4: u8,
    q5: u8,
    q6: u8,
    q7: u8,
    q8: u8,
    q9: u8,
    q10: LearningFormat,
}

impl TryFrom<AnswersDocument> for Answers {
    type Error = AnswerError;

    fn try_from(doc: AnswersDocument) -> Result<Self, Self::Error> {
        Answers::new(
            [
                doc.q1, doc.q2, doc.q3, doc.q4, doc.q5, doc.q6, doc.q7, doc.q8, doc.q9,
            ],
            doc.q10,
        )
    }
}

impl From<Answers> for AnswersDocument {
    fn from(answers: Answers) -> Self {
        let [q1, q2, q3, q4, q5, q6, q7, q8, q9] = answers.scored;
        AnswersDocument {
            q1,
            q2,
            q3,
            q4,
            q5,
            q6,
            q7,
            q8,
            q9,
            q10: answers.preference,
        }
    }
}

/// Answers collected so far, one question at a time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerSet {
    scored: [Option<u8>; SCORED_QUESTION_COUNT],
    preference: Option<LearningFormat>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer, replacing any previous answer to the same question
    pub fn set(&mut self, id: &str, value: AnswerValue) -> Result<(), AnswerError> {
        let question =
            questions::question(id).ok_or_else(|| AnswerError::UnknownQuestion(id.to_string()))?;
        if !question.accepts(&value) {
            return Err(AnswerError::OutOfDomain {
                id: id.to_string(),
                value: value.to_string(),
            });
        }
        match value {
            AnswerValue::Format(format) => self.preference = Some(format),
            AnswerValue::Points(points) => {
                // accepts() guarantees a scored question here
                if let Some(slot) = questions::position(id).and_then(|i| self.scored.get_mut(i)) {
                    *slot = Some(points);
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<AnswerValue> {
        if id == PREFERENCE_QUESTION_ID {
            return self.preference.map(AnswerValue::Format);
        }
        questions::position(id)
            .and_then(|i| self.scored.get(i).copied().flatten())
            .map(AnswerValue::Points)
    }

    /// Number of questions answered
    pub fn len(&self) -> usize {
        self.scored.iter().filter(|v| v.is_some()).count() + usize::from(self.preference.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Question ids that still have no answer, in questionnaire order
    pub fn missing(&self) -> Vec<&'static str> {
        questions::questions()
            .iter()
            .filter(|q| self.get(q.id).is_none())
            .map(|q| q.id)
            .collect()
    }

    /// Freeze into a complete answer set
    pub fn complete(&self) -> Result<Answers, AnswerError> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(AnswerError::Missing {
                ids: missing.into_iter().map(String::from).collect(),
            });
        }
        let mut scored = [0u8; SCORED_QUESTION_COUNT];
        for (slot, value) in scored.iter_mut().zip(self.scored.iter()) {
            *slot = value.unwrap_or_default();
        }
        let preference = self.preference.ok_or_else(|| AnswerError::Missing {
            ids: vec![PREFERENCE_QUESTION_ID.to_string()],
        })?;
        Answers::new(scored, preference)
    }
}
