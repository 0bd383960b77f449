//! Read-only view of mobile app users and their assessment history.
//!
//! The app writes `users`, `test_responses` and `user_lesson_completions`;
//! this module only groups them per user for the dashboard.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::scoring::ScoreBand;
use crate::store::{Query, Record, RecordStore, StoreError, APP_ATTEMPTS, APP_USERS, LESSON_COMPLETIONS};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppUser {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub base_score: Option<u8>,
    #[serde(default)]
    pub latest_score: Option<u8>,
    #[serde(default)]
    pub latest_score_band: Option<ScoreBand>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_streak_days: Option<u32>,
    #[serde(default)]
    pub longest_streak_days: Option<u32>,
    #[serde(default)]
    pub total_content_completed: Option<u32>,
    #[serde(default)]
    pub total_learning_minutes: Option<u32>,
}

/// One assessment taken in the app
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Attempt {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub base_score: u8,
    pub score_band: ScoreBand,
    #[serde(default)]
    pub is_retake: Option<bool>,
    #[serde(default)]
    pub attempt_number: Option<u32>,
    #[serde(default)]
    pub score_change: Option<i32>,
    #[serde(default)]
    pub lessons_completed_at_assessment: Option<u32>,
}

impl Attempt {
    pub fn is_retake(&self) -> bool {
        self.is_retake.unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LessonCompletion {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub content_slug: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub time_spent_seconds: Option<u64>,
}

impl LessonCompletion {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

/// A user with their attempts (oldest first) and lesson progress
#[derive(Debug, Clone, PartialEq)]
pub struct UserActivity {
    pub user: AppUser,
    pub attempts: Vec<Attempt>,
    pub lessons: Vec<LessonCompletion>,
}

impl UserActivity {
    pub fn full_name(&self) -> String {
        let name = format!(
            "{} {}",
            self.user.first_name.as_deref().unwrap_or(""),
            self.user.last_name.as_deref().unwrap_or("")
        );
        let name = name.trim();
        if name.is_empty() {
            "Unknown User".to_string()
        } else {
            name.to_string()
        }
    }

    pub fn base_score(&self) -> u8 {
        self.user.base_score.unwrap_or(0)
    }

    /// Latest score, falling back to the base score
    pub fn latest_score(&self) -> u8 {
        self.user.latest_score.or(self.user.base_score).unwrap_or(0)
    }

    /// Points gained since the first assessment, lesson points included
    pub fn improvement(&self) -> i32 {
        i32::from(self.latest_score()) - i32::from(self.base_score())
    }

    /// The user's current band, else the band of their latest attempt
    pub fn band(&self) -> Option<ScoreBand> {
        self.user
            .latest_score_band
            .or_else(|| self.attempts.last().map(|a| a.score_band))
    }

    pub fn retakes(&self) -> usize {
        self.attempts.iter().filter(|a| a.is_retake()).count()
    }

    pub fn completed_lessons(&self) -> usize {
        self.lessons.iter().filter(|l| l.is_completed()).count()
    }

    /// Stored total, or the sum of lesson time when the total is unset
    pub fn learning_minutes(&self) -> u32 {
        match self.user.total_learning_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => {
                let seconds: u64 = self.lessons.iter().filter_map(|l| l.time_spent_seconds).sum();
                ((seconds as f64) / 60.0).round() as u32
            }
        }
    }

    pub fn lessons_done(&self) -> usize {
        match self.user.total_content_completed {
            Some(done) if done > 0 => done as usize,
            _ => self.completed_lessons(),
        }
    }
}

/// Attach attempts and lessons to their users. Users without any attempt
/// are dropped; the rest are newest account first.
pub fn group_activity(
    users: Vec<AppUser>,
    attempts: Vec<Attempt>,
    lessons: Vec<LessonCompletion>,
) -> Vec<UserActivity> {
    let mut activity: Vec<UserActivity> = users
        .into_iter()
        .map(|user| UserActivity {
            user,
            attempts: Vec::new(),
            lessons: Vec::new(),
        })
        .collect();
    let index: HashMap<String, usize> = activity
        .iter()
        .enumerate()
        .map(|(i, a)| (a.user.id.clone(), i))
        .collect();

    for attempt in attempts {
        if let Some(&i) = attempt.user_id.as_ref().and_then(|id| index.get(id)) {
            activity[i].attempts.push(attempt);
        }
    }
    for lesson in lessons {
        if let Some(&i) = lesson.user_id.as_ref().and_then(|id| index.get(id)) {
            activity[i].lessons.push(lesson);
        }
    }

    activity.retain(|a| !a.attempts.is_empty());
    activity.sort_by(|a, b| b.user.created_at.cmp(&a.user.created_at));
    activity
}

/// Headline numbers for the users view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserStats {
    pub users: usize,
    pub tests: usize,
    /// Rounded mean of latest scores, 0 with no users
    pub average_score: u8,
    pub retakes: usize,
    /// Content items available to users
    pub lessons: usize,
}

impl UserStats {
    pub fn from_activity(activity: &[UserActivity], content_items: usize) -> Self {
        let users = activity.len();
        let sum: u64 = activity.iter().map(|a| u64::from(a.latest_score())).sum();
        let average_score = if users > 0 {
            (sum as f64 / users as f64).round() as u8
        } else {
            0
        };

        Self {
            users,
            tests: activity.iter().map(|a| a.attempts.len()).sum(),
            average_score,
            retakes: activity.iter().map(UserActivity::retakes).sum(),
            lessons: content_items,
        }
    }
}

fn parse_rows<T: serde::de::DeserializeOwned>(rows: Vec<Record>, what: &str) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value(Value::Object(row)) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!(error = %e, kind = what, "skipping malformed row");
                None
            }
        })
        .collect()
}

/// Read users, their attempts and lesson completions from the store
pub async fn load_activity<S: RecordStore>(store: &S) -> Result<Vec<UserActivity>, StoreError> {
    let users = store
        .select(APP_USERS, &Query::new().order_by("created_at", false))
        .await?;
    let attempts = store
        .select(APP_ATTEMPTS, &Query::new().order_by("created_at", true))
        .await?;
    let lessons = store
        .select(LESSON_COMPLETIONS, &Query::new().order_by("completed_at", true))
        .await?;

    Ok(group_activity(
        parse_rows(users, "user"),
        parse_rows(attempts, "attempt"),
        parse_rows(lessons, "lesson completion"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LocalStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn user(id: &str, day: u32) -> AppUser {
        AppUser {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            first_name: Some(id.to_string()),
            created_at: Some(Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap()),
            ..Default::default()
        }
    }

    fn attempt(id: &str, user_id: &str, score: u8, retake: bool) -> Attempt {
        Attempt {
            id: id.to_string(),
            user_id: Some(user_id.to_string()),
            created_at: None,
            base_score: score,
            score_band: ScoreBand::from_base_score(score),
            is_retake: Some(retake),
            attempt_number: None,
            score_change: None,
            lessons_completed_at_assessment: None,
        }
    }

    fn lesson(user_id: &str, status: &str, seconds: u64) -> LessonCompletion {
        LessonCompletion {
            id: format!("{}-{}", user_id, status),
            user_id: Some(user_id.to_string()),
            content_slug: "intro".to_string(),
            status: status.to_string(),
            completed_at: None,
            time_spent_seconds: Some(seconds),
        }
    }

    #[test]
    fn test_group_drops_users_without_attempts() {
        let grouped = group_activity(
            vec![user("old", 1), user("idle", 2), user("new", 3)],
            vec![
                attempt("a1", "old", 40, false),
                attempt("a2", "new", 60, false),
                attempt("a3", "old", 55, true),
                attempt("stray", "nobody", 10, false),
            ],
            vec![lesson("old", "completed", 120)],
        );

        let ids: Vec<_> = grouped.iter().map(|a| a.user.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(grouped[1].attempts.len(), 2);
        assert_eq!(grouped[1].retakes(), 1);
        assert_eq!(grouped[1].lessons.len(), 1);
    }

    #[test]
    fn test_scores_and_band_fallbacks() {
        let mut activity = UserActivity {
            user: AppUser {
                base_score: Some(40),
                ..user("u", 1)
            },
            attempts: vec![attempt("a1", "u", 40, false), attempt("a2", "u", 75, true)],
            lessons: vec![lesson("u", "completed", 90), lesson("u", "in_progress", 60)],
        };
        assert_eq!(activity.latest_score(), 40);
        assert_eq!(activity.improvement(), 0);
        assert_eq!(activity.band(), Some(ScoreBand::Strong));
        assert_eq!(activity.completed_lessons(), 1);
        assert_eq!(activity.lessons_done(), 1);
        assert_eq!(activity.learning_minutes(), 3);

        activity.user.latest_score = Some(78);
        activity.user.latest_score_band = Some(ScoreBand::Strong);
        activity.user.total_learning_minutes = Some(12);
        assert_eq!(activity.improvement(), 38);
        assert_eq!(activity.learning_minutes(), 12);
    }

    #[test]
    fn test_full_name_fallback() {
        let activity = UserActivity {
            user: AppUser {
                id: "x".into(),
                ..Default::default()
            },
            attempts: vec![],
            lessons: vec![],
        };
        assert_eq!(activity.full_name(), "Unknown User");
    }

    #[test]
    fn test_stats() {
        let grouped = group_activity(
            vec![
                AppUser {
                    latest_score: Some(80),
                    ..user("a", 1)
                },
                AppUser {
                    base_score: Some(45),
                    ..user("b", 2)
                },
            ],
            vec![
                attempt("1", "a", 60, false),
                attempt("2", "a", 80, true),
                attempt("3", "b", 45, false),
            ],
            vec![],
        );
        let stats = UserStats::from_activity(&grouped, 7);
        assert_eq!(
            stats,
            UserStats {
                users: 2,
                tests: 3,
                average_score: 63,
                retakes: 1,
                lessons: 7,
            }
        );
        assert_eq!(UserStats::from_activity(&[], 0).average_score, 0);
    }

    #[tokio::test]
    async fn test_load_activity_from_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path().join("store.json"));

        // Nothing written by the app yet
        assert!(load_activity(&store).await.unwrap().is_empty());

        let row = |value: Value| match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        store
            .insert(
                APP_USERS,
                row(json!({"id": "u1", "email": "sam@example.com", "first_name": "Sam",
                            "last_name": null, "base_score": 44, "latest_score": 71,
                            "latest_score_band": "strong"})),
            )
            .await
            .unwrap();
        store
            .insert(
                APP_ATTEMPTS,
                row(json!({"id": "t1", "user_id": "u1", "base_score": 44,
                            "score_band": "developing", "is_retake": false})),
            )
            .await
            .unwrap();
        store
            .insert(
                LESSON_COMPLETIONS,
                row(json!({"id": "l1", "user_id": "u1", "content_slug": "intro",
                            "status": "completed", "time_spent_seconds": 300})),
            )
            .await
            .unwrap();

        let activity = load_activity(&store).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].full_name(), "Sam");
        assert_eq!(activity[0].improvement(), 27);
        assert_eq!(activity[0].learning_minutes(), 5);
    }
}
