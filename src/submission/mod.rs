//! Respondent details and the persisted quiz submission.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::LazyLock;

use crate::quiz::{self, Answers};
use crate::scoring::{calculate_score, ScoreBand, ScoreResult};
use crate::store::{Record, RecordStore, StoreError, SUBMISSIONS};

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

/// Whether `email` looks like a deliverable address
pub fn is_valid_email(email: &str) -> bool {
    match EMAIL_RE.as_ref() {
        Some(re) => re.is_match(email),
        None => email.contains('@'),
    }
}

/// Details the respondent gives after the last question
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub location: Option<String>,
}

impl UserInfo {
    pub fn new(first_name: &str, last_name: &str, email: &str) -> Self {
        Self {
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            email: email.trim().to_string(),
            location: None,
        }
    }

    pub fn with_location(mut self, location: Option<&str>) -> Self {
        self.location = location
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string);
        self
    }

    /// Validate every field, collecting all problems
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.first_name.trim().is_empty() {
            errors.push("First name is required".to_string());
        }
        if self.last_name.trim().is_empty() {
            errors.push("Last name is required".to_string());
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push("Email is required".to_string());
        } else if !is_valid_email(email) {
            errors.push("Please enter a valid email".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A completed, scored questionnaire ready to be stored.
///
/// The score is computed once, here, and never recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub user: UserInfo,
    pub answers: Answers,
    pub score: ScoreResult,
}

impl Submission {
    pub fn new(user: UserInfo, answers: &Answers) -> Self {
        let score = calculate_score(answers);
        tracing::debug!(
            total_points = score.total_points,
            base_score = score.base_score,
            band = %score.score_band,
            "scored submission"
        );
        Self {
            user,
            answers: *answers,
            score,
        }
    }

    /// (question id, question text, selected option label) in questionnaire order
    pub fn responses(&self) -> Vec<(&'static str, &'static str, &'static str)> {
        self.answers
            .iter()
            .filter_map(|(id, value)| {
                let question = quiz::question(id)?;
                let label = question.label_for(&value)?;
                Some((id, question.prompt, label))
            })
            .collect()
    }

    /// Required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.user.first_name.trim().is_empty() {
            missing.push("first_name");
        }
        if self.user.last_name.trim().is_empty() {
            missing.push("last_name");
        }
        if self.user.email.trim().is_empty() {
            missing.push("email");
        }
        if self.responses().len() != quiz::questions().len() {
            missing.push("answers");
        }
        missing
    }

    /// Row for the submissions collection: question text in `qN`, the chosen
    /// label in `qN_label`
    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        record.insert("first_name".into(), self.user.first_name.clone().into());
        record.insert("last_name".into(), self.user.last_name.clone().into());
        record.insert("email".into(), self.user.email.clone().into());
        record.insert(
            "location".into(),
            self.user
                .location
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );

        for (id, prompt, label) in self.responses() {
            record.insert(id.to_string(), prompt.into());
            record.insert(format!("{}_label", id), label.into());
        }

        record.insert("base_score".into(), self.score.base_score.into());
        record.insert("score_band".into(), self.score.score_band.as_str().into());
        record
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("submission is missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("submission already stored: {0}")]
    Duplicate(String),

    #[error("submission rejected by the store: {0}")]
    InvalidData(String),

    #[error("could not store submission: {0}")]
    Unavailable(String),
}

impl SubmitError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SubmitError::MissingFields(_) => "Missing required fields",
            SubmitError::Duplicate(_) => "Test response already exists",
            SubmitError::InvalidData(_) => "Invalid test data provided",
            SubmitError::Unavailable(_) => "Something went wrong. Please try again in a moment.",
        }
    }
}

impl From<StoreError> for SubmitError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueViolation { message } => SubmitError::Duplicate(message),
            StoreError::CheckViolation { message } => SubmitError::InvalidData(message),
            other => SubmitError::Unavailable(other.to_string()),
        }
    }
}

/// Persist a submission. Returns the id the store assigned.
pub async fn submit<S: RecordStore>(store: &S, submission: &Submission) -> Result<String, SubmitError> {
    let missing = submission.missing_fields();
    if !missing.is_empty() {
        return Err(SubmitError::MissingFields(missing));
    }

    let saved = store
        .insert(SUBMISSIONS, submission.to_record())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "failed to store submission");
            SubmitError::from(e)
        })?;

    let id = match saved.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    tracing::info!(id = %id, band = %submission.score.score_band, "stored submission");
    Ok(id)
}

/// A submission as read back from the store
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSubmission {
    pub id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub location: Option<String>,
    pub base_score: u8,
    pub score_band: ScoreBand,
    /// (question text, answer label) for each question present in the row
    pub responses: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct SubmissionColumns {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    location: Option<String>,
    base_score: u8,
    score_band: ScoreBand,
}

impl StoredSubmission {
    pub fn from_record(record: &Record) -> Result<Self, serde_json::Error> {
        let columns: SubmissionColumns = serde_json::from_value(Value::Object(record.clone()))?;

        let responses = quiz::questions()
            .iter()
            .filter_map(|q| {
                let label = record.get(&format!("{}_label", q.id))?.as_str()?;
                let text = record
                    .get(q.id)
                    .and_then(Value::as_str)
                    .unwrap_or(q.prompt);
                Some((text.to_string(), label.to_string()))
            })
            .collect();

        let id = match columns.id {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        };

        Ok(Self {
            id,
            created_at: columns.created_at,
            first_name: columns.first_name,
            last_name: columns.last_name,
            email: columns.email,
            location: columns.location,
            base_score: columns.base_score,
            score_band: columns.score_band,
            responses,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
