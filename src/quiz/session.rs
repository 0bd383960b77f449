use super::answers::{AnswerError, AnswerSet, AnswerValue, Answers};
use super::questions::{self, Question};
use crate::submission::{Submission, UserInfo};

/// Where the respondent is after moving forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Now showing the question at this step (0-based)
    Question(usize),
    /// Every question answered; collect respondent details next
    Details,
}

/// One respondent's pass through the questionnaire.
///
/// Holds the current step and the answers so far. The value is owned by the
/// caller and threaded through the flow; nothing about an in-progress quiz
/// lives outside it.
#[derive(Debug, Clone, Default)]
pub struct QuizSession {
    step: usize,
    answers: AnswerSet,
    on_details: bool,
}

impl QuizSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current step (0-based)
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total(&self) -> usize {
        questions::questions().len()
    }

    pub fn current(&self) -> &'static Question {
        &questions::questions()[self.step]
    }

    pub fn on_details(&self) -> bool {
        self.on_details
    }

    /// Answer the current question
    pub fn select(&mut self, value: AnswerValue) -> Result<(), AnswerError> {
        let id = self.current().id;
        self.answers.set(id, value)
    }

    /// Answer recorded for the current question, if any
    pub fn selected(&self) -> Option<AnswerValue> {
        self.answers.get(self.current().id)
    }

    pub fn can_proceed(&self) -> bool {
        self.on_details || self.selected().is_some()
    }

    /// Move forward. Stays put when the current question is unanswered.
    pub fn next(&mut self) -> Advance {
        if self.on_details {
            return Advance::Details;
        }
        if self.selected().is_none() {
            return Advance::Question(self.step);
        }
        if self.step + 1 < self.total() {
            self.step += 1;
            Advance::Question(self.step)
        } else {
            self.on_details = true;
            Advance::Details
        }
    }

    /// Move back one screen. Returns false at the first question.
    pub fn back(&mut self) -> bool {
        if self.on_details {
            self.on_details = false;
            true
        } else if self.step > 0 {
            self.step -= 1;
            true
        } else {
            false
        }
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn is_complete(&self) -> bool {
        self.answers.missing().is_empty()
    }

    /// Selected option label per answered question, in questionnaire order
    pub fn labels(&self) -> Vec<(&'static str, &'static str)> {
        questions::questions()
            .iter()
            .filter_map(|q| {
                self.answers
                    .get(q.id)
                    .and_then(|v| q.label_for(&v))
                    .map(|label| (q.id, label))
            })
            .collect()
    }

    /// Close the session and score it. Consumes the session so answers cannot
    /// change after submission.
    pub fn finish(self, user: UserInfo) -> Result<Submission, AnswerError> {
        let answers: Answers = self.answers.complete()?;
        Ok(Submission::new(user, &answers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::LearningFormat;
    use crate::scoring::ScoreBand;

    fn user() -> UserInfo {
        UserInfo {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            location: None,
        }
    }

    fn answer_all(session: &mut QuizSession, points: u8) {
        loop {
            let value = if session.current().is_scored() {
                AnswerValue::Points(points)
            } else {
                AnswerValue::Format(LearningFormat::Lessons)
            };
            session.select(value).unwrap();
            if session.next() == Advance::Details {
                break;
            }
        }
    }

    #[test]
    fn test_next_requires_answer() {
        let mut session = QuizSession::new();
        assert!(!session.can_proceed());
        assert_eq!(session.next(), Advance::Question(0));
        session.select(AnswerValue::Points(2)).unwrap();
        assert_eq!(session.next(), Advance::Question(1));
    }

    #[test]
    fn test_back_keeps_answers() {
        let mut session = QuizSession::new();
        assert!(!session.back());
        session.select(AnswerValue::Points(3)).unwrap();
        session.next();
        assert!(session.back());
        assert_eq!(session.step(), 0);
        assert_eq!(session.selected(), Some(AnswerValue::Points(3)));
    }

    #[test]
    fn test_select_validates_against_current_question() {
        let mut session = QuizSession::new();
        session.select(AnswerValue::Points(3)).unwrap();
        session.next();
        // q2 only offers 1 and 3
        assert!(session.select(AnswerValue::Points(2)).is_err());
    }

    #[test]
    fn test_full_flow_reaches_details_and_scores() {
        let mut session = QuizSession::new();
        answer_all(&mut session, 3);
        assert!(session.on_details());
        assert!(session.is_complete());
        assert_eq!(session.labels().len(), 10);
        assert!(session.back());
        assert!(!session.on_details());
        assert_eq!(session.step(), 9);

        let submission = session.finish(user()).unwrap();
        assert_eq!(submission.score.base_score, 100);
        assert_eq!(submission.score.score_band, ScoreBand::Ready);
    }

    #[test]
    fn test_finish_incomplete_fails() {
        let mut session = QuizSession::new();
        session.select(AnswerValue::Points(1)).unwrap();
        assert!(matches!(
            session.finish(user()),
            Err(AnswerError::Missing { .. })
        ));
    }
}
