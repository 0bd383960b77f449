//! Data behind the staff dashboard and the `submissions` listing.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::content::{self, ContentError, ContentItem};
use crate::scoring::ScoreBand;
use crate::store::{Filter, Query, RecordStore, StoreError, SUBMISSIONS};
use crate::submission::StoredSubmission;
use crate::users::{self, UserActivity, UserStats};

/// Per-band counts and the average base score
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BandSummary {
    pub counts: BTreeMap<ScoreBand, usize>,
    pub total: usize,
    /// Rounded mean of base scores, `None` when there are no submissions
    pub average_score: Option<u8>,
}

impl BandSummary {
    pub fn from_submissions(submissions: &[StoredSubmission]) -> Self {
        let mut counts: BTreeMap<ScoreBand, usize> =
            ScoreBand::ALL.iter().map(|&b| (b, 0)).collect();
        let mut sum: u64 = 0;

        for s in submissions {
            *counts.entry(s.score_band).or_default() += 1;
            sum += u64::from(s.base_score);
        }

        let total = submissions.len();
        let average_score = (total > 0).then(|| (sum as f64 / total as f64).round() as u8);

        Self {
            counts,
            total,
            average_score,
        }
    }

    pub fn count(&self, band: ScoreBand) -> usize {
        self.counts.get(&band).copied().unwrap_or(0)
    }

    /// Share of submissions in `band`, 0.0..=1.0
    pub fn share(&self, band: ScoreBand) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.count(band) as f64 / self.total as f64
        }
    }
}

/// Narrows the submission list
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionFilter {
    pub band: Option<ScoreBand>,
    /// Only submissions newer than this
    pub since: Option<Duration>,
}

impl SubmissionFilter {
    /// Parse a humantime age such as "7d" or "12h"
    pub fn parse_since(value: &str) -> Result<Duration, humantime::DurationError> {
        humantime::parse_duration(value.trim())
    }

    /// The same filter with the band dropped, for views that filter by band
    /// themselves after loading
    pub fn without_band(&self) -> Self {
        Self {
            band: None,
            since: self.since,
        }
    }

    pub fn matches(&self, submission: &StoredSubmission, now: DateTime<Utc>) -> bool {
        if let Some(band) = self.band {
            if submission.score_band != band {
                return false;
            }
        }
        if let Some(since) = self.since {
            let Some(created_at) = submission.created_at else {
                return false;
            };
            let Ok(age) = chrono::Duration::from_std(since) else {
                return true;
            };
            if created_at < now - age {
                return false;
            }
        }
        true
    }

    pub fn apply(&self, submissions: Vec<StoredSubmission>, now: DateTime<Utc>) -> Vec<StoredSubmission> {
        submissions
            .into_iter()
            .filter(|s| self.matches(s, now))
            .collect()
    }
}

/// Submissions newest first. The band filter is pushed down to the store.
pub async fn load_submissions<S: RecordStore>(
    store: &S,
    filter: &SubmissionFilter,
) -> Result<Vec<StoredSubmission>, StoreError> {
    let mut query = Query::new().order_by("created_at", false);
    if let Some(band) = filter.band {
        query = query.filter(Filter::eq("score_band", band.as_str()));
    }

    let rows = store.select(SUBMISSIONS, &query).await?;
    let mut submissions = Vec::with_capacity(rows.len());
    for row in &rows {
        match StoredSubmission::from_record(row) {
            Ok(s) => submissions.push(s),
            Err(e) => tracing::warn!(error = %e, "skipping malformed submission"),
        }
    }

    Ok(filter.apply(submissions, Utc::now()))
}

#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Failed to load submissions: {0}")]
    Submissions(StoreError),

    #[error("Failed to load content: {0}")]
    Content(ContentError),
}

/// Everything the dashboard shows
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub users: Vec<UserActivity>,
    pub user_stats: UserStats,
    pub submissions: Vec<StoredSubmission>,
    pub content: Vec<ContentItem>,
    pub summary: BandSummary,
}

impl DashboardData {
    /// Load every tab. App users are optional: a store without the app's
    /// tables shows an empty users tab instead of failing.
    pub async fn load<S: RecordStore>(store: &S, filter: &SubmissionFilter) -> Result<Self, DashboardError> {
        let submissions = load_submissions(store, filter)
            .await
            .map_err(DashboardError::Submissions)?;
        let content = content::list(store).await.map_err(DashboardError::Content)?;
        let users = users::load_activity(store).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load app users");
            Vec::new()
        });

        let summary = BandSummary::from_submissions(&submissions);
        let user_stats = UserStats::from_activity(&users, content.len());

        tracing::debug!(
            users = users.len(),
            submissions = submissions.len(),
            content = content.len(),
            "loaded dashboard data"
        );

        Ok(Self {
            users,
            user_stats,
            submissions,
            content,
            summary,
        })
    }

    pub fn published_count(&self) -> usize {
        self.content.iter().filter(|c| c.is_published).count()
    }
}
