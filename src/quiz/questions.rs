use super::answers::{AnswerValue, LearningFormat};

/// Number of questions that contribute to the score (q1..q9)
pub const SCORED_QUESTION_COUNT: usize = 9;

/// Identifier of the unscored learning-format question
pub const PREFERENCE_QUESTION_ID: &str = "q10";

/// A selectable option on a scored question.
///
/// `value` is what gets recorded as the answer; `weight` is the number of
/// points the option is worth. The questionnaire keeps the two equal and the
/// engine sums answer values, see `tests::test_scored_weight_matches_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredOption {
    pub label: &'static str,
    pub value: u8,
    pub weight: u8,
}

/// A selectable option on the preference question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceOption {
    pub label: &'static str,
    pub value: LearningFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    Scored(&'static [ScoredOption]),
    Preference(&'static [PreferenceOption]),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub id: &'static str,
    pub prompt: &'static str,
    pub kind: QuestionKind,
}

impl Question {
    pub fn is_scored(&self) -> bool {
        matches!(self.kind, QuestionKind::Scored(_))
    }

    /// Option labels in display order
    pub fn option_labels(&self) -> Vec<&'static str> {
        match self.kind {
            QuestionKind::Scored(options) => options.iter().map(|o| o.label).collect(),
            QuestionKind::Preference(options) => options.iter().map(|o| o.label).collect(),
        }
    }

    /// Answer value of the option at `index` (0-based, display order)
    pub fn option_value(&self, index: usize) -> Option<AnswerValue> {
        match self.kind {
            QuestionKind::Scored(options) => {
                options.get(index).map(|o| AnswerValue::Points(o.value))
            }
            QuestionKind::Preference(options) => {
                options.get(index).map(|o| AnswerValue::Format(o.value))
            }
        }
    }

    /// Whether `value` is one of this question's options
    pub fn accepts(&self, value: &AnswerValue) -> bool {
        self.label_for(value).is_some()
    }

    /// Label of the option matching `value`
    pub fn label_for(&self, value: &AnswerValue) -> Option<&'static str> {
        match (self.kind, value) {
            (QuestionKind::Scored(options), AnswerValue::Points(points)) => options
                .iter()
                .find(|o| o.value == *points)
                .map(|o| o.label),
            (QuestionKind::Preference(options), AnswerValue::Format(format)) => options
                .iter()
                .find(|o| o.value == *format)
                .map(|o| o.label),
            _ => None,
        }
    }

    /// Highest weight among the options; zero for the preference question
    pub fn max_weight(&self) -> u8 {
        match self.kind {
            QuestionKind::Scored(options) => options.iter().map(|o| o.weight).max().unwrap_or(0),
            QuestionKind::Preference(_) => 0,
        }
    }
}

const fn scored(label: &'static str, value: u8) -> ScoredOption {
    ScoredOption {
        label,
        value,
        weight: value,
    }
}

const fn preference(label: &'static str, value: LearningFormat) -> PreferenceOption {
    PreferenceOption { label, value }
}

static QUESTIONS: [Question; 10] = [
    Question {
        id: "q1",
        prompt: "Do you have a clear problem you are solving?",
        kind: QuestionKind::Scored(&[
            scored("Yes", 3),
            scored("Somewhat", 2),
            scored("No", 1),
        ]),
    },
    Question {
        id: "q2",
        prompt: "Can you explain the problem in one sentence?",
        kind: QuestionKind::Scored(&[scored("Yes", 3), scored("No", 1)]),
    },
    Question {
        id: "q3",
        prompt: "Do you have a defined customer segment?",
        kind: QuestionKind::Scored(&[
            scored("Yes", 3),
            scored("Not really", 2),
            scored("No", 1),
        ]),
    },
    Question {
        id: "q4",
        prompt: "Have you validated your problem with real people?",
        kind: QuestionKind::Scored(&[
            scored("Yes, many", 3),
            scored("Yes, a few", 2),
            scored("No", 1),
        ]),
    },
    Question {
        id: "q5",
        prompt: "Do you have a prototype or demo?",
        kind: QuestionKind::Scored(&[
            scored("Yes, working", 3),
            scored("In progress", 2),
            scored("No", 1),
        ]),
    },
    Question {
        id: "q6",
        prompt: "Do you have traction?",
        kind: QuestionKind::Scored(&[
            scored("Yes, measurable", 3),
            scored("Some interest", 2),
            scored("No", 1),
        ]),
    },
    Question {
        id: "q7",
        prompt: "Are you working on this consistently?",
        kind: QuestionKind::Scored(&[
            scored("Yes", 3),
            scored("On and off", 2),
            scored("No", 1),
        ]),
    },
    Question {
        id: "q8",
        prompt: "Do you have a co-founder or team?",
        kind: QuestionKind::Scored(&[
            scored("Yes", 3),
            scored("Not yet", 2),
            scored("Solo", 1),
        ]),
    },
    Question {
        id: "q9",
        prompt: "How clear is your founder story?",
        kind: QuestionKind::Scored(&[
            scored("Very clear", 3),
            scored("Somewhat", 2),
            scored("Not clear", 1),
        ]),
    },
    Question {
        id: PREFERENCE_QUESTION_ID,
        prompt: "Preferred learning format",
        kind: QuestionKind::Preference(&[
            preference("Short Lessons", LearningFormat::Lessons),
            preference("Articles", LearningFormat::Articles),
            preference("Stories", LearningFormat::Stories),
            preference("Debates", LearningFormat::Debates),
            preference("Conversations", LearningFormat::Conversations),
        ]),
    },
];

/// The full questionnaire in presentation order
pub fn questions() -> &'static [Question] {
    &QUESTIONS
}

/// Look up a question by its identifier ("q1".."q10")
pub fn question(id: &str) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.id == id)
}

/// Position of a question in the questionnaire (0-based)
pub fn position(id: &str) -> Option<usize> {
    QUESTIONS.iter().position(|q| q.id == id)
}

/// Sum of the highest weight on every scored question
pub fn max_points() -> u32 {
    QUESTIONS.iter().map(|q| u32::from(q.max_weight())).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_counts() {
        assert_eq!(questions().len(), 10);
        assert_eq!(
            questions().iter().filter(|q| q.is_scored()).count(),
            SCORED_QUESTION_COUNT
        );
        assert!(!question(PREFERENCE_QUESTION_ID).unwrap().is_scored());
    }

    #[test]
    fn test_scored_questions_come_first() {
        for (i, q) in questions().iter().take(SCORED_QUESTION_COUNT).enumerate() {
            assert_eq!(q.id, format!("q{}", i + 1));
            assert!(q.is_scored());
        }
    }

    #[test]
    fn test_scored_weight_matches_value() {
        for q in questions() {
            if let QuestionKind::Scored(options) = q.kind {
                for option in options {
                    assert_eq!(option.weight, option.value, "{} / {}", q.id, option.label);
                }
            }
        }
    }

    #[test]
    fn test_max_points_is_27() {
        assert_eq!(max_points(), 27);
        assert_eq!(max_points(), crate::scoring::MAX_POINTS);
    }

    #[test]
    fn test_q2_only_accepts_one_or_three() {
        let q2 = question("q2").unwrap();
        assert!(q2.accepts(&AnswerValue::Points(1)));
        assert!(!q2.accepts(&AnswerValue::Points(2)));
        assert!(q2.accepts(&AnswerValue::Points(3)));
    }

    #[test]
    fn test_label_for() {
        let q4 = question("q4").unwrap();
        assert_eq!(q4.label_for(&AnswerValue::Points(2)), Some("Yes, a few"));
        assert_eq!(q4.label_for(&AnswerValue::Format(LearningFormat::Stories)), None);

        let q10 = question("q10").unwrap();
        assert_eq!(
            q10.label_for(&AnswerValue::Format(LearningFormat::Lessons)),
            Some("Short Lessons")
        );
        assert_eq!(q10.label_for(&AnswerValue::Points(3)), None);
    }

    #[test]
    fn test_option_value_by_index() {
        let q1 = question("q1").unwrap();
        assert_eq!(q1.option_value(0), Some(AnswerValue::Points(3)));
        assert_eq!(q1.option_value(2), Some(AnswerValue::Points(1)));
        assert_eq!(q1.option_value(3), None);
    }

    #[test]
    fn test_unknown_question() {
        assert!(question("q11").is_none());
        assert_eq!(position("q3"), Some(2));
    }
}
