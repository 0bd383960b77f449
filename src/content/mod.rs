//! Lesson content items shown to subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::store::{Filter, Query, Record, RecordStore, StoreError, CONTENT_ITEMS};

pub const DEFAULT_AUTHOR: &str = "Founder Groundworks Team";
pub const DEFAULT_DURATION_MINUTES: u32 = 5;
pub const DEFAULT_DISPLAY_ORDER: i64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentFormat {
    #[default]
    Lesson,
    Article,
    Story,
    Debate,
    Conversation,
}

impl ContentFormat {
    pub const ALL: [ContentFormat; 5] = [
        ContentFormat::Lesson,
        ContentFormat::Article,
        ContentFormat::Story,
        ContentFormat::Debate,
        ContentFormat::Conversation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentFormat::Lesson => "lesson",
            ContentFormat::Article => "article",
            ContentFormat::Story => "story",
            ContentFormat::Debate => "debate",
            ContentFormat::Conversation => "conversation",
        }
    }
}

impl fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentFormat {
    type Err = ContentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        ContentFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or(ContentError::UnknownFormat(s))
    }
}

/// Fields supplied when creating or editing an item. Unset fields take
/// their defaults when written.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContentDraft {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub format: Option<ContentFormat>,
    #[serde(default)]
    pub content: Option<Value>,
    #[serde(default)]
    pub category_slug: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_premium: Option<bool>,
    #[serde(default)]
    pub is_published: Option<bool>,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub display_order: Option<i64>,
}

impl ContentDraft {
    pub fn new(slug: &str, title: &str) -> Self {
        Self {
            slug: slug.trim().to_string(),
            title: title.trim().to_string(),
            ..Default::default()
        }
    }

    fn require_slug_and_title(&self) -> Result<(), ContentError> {
        if self.slug.trim().is_empty() || self.title.trim().is_empty() {
            return Err(ContentError::MissingSlugOrTitle);
        }
        Ok(())
    }

    fn is_published(&self) -> bool {
        self.is_published.unwrap_or(true)
    }

    /// Columns shared by create and update, with defaults applied.
    /// Zero duration and zero display order count as unset.
    fn columns(&self) -> Record {
        let mut record = Record::new();
        record.insert("slug".into(), self.slug.trim().into());
        record.insert("title".into(), self.title.trim().into());
        record.insert(
            "description".into(),
            self.description.clone().map(Value::String).unwrap_or(Value::Null),
        );
        record.insert(
            "format".into(),
            self.format.unwrap_or_default().as_str().into(),
        );
        record.insert("content".into(), self.content.clone().unwrap_or(Value::Null));
        record.insert(
            "category_slug".into(),
            self.category_slug
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
        record.insert(
            "tags".into(),
            self.tags.clone().unwrap_or_default().into(),
        );
        record.insert(
            "is_premium".into(),
            self.is_premium.unwrap_or(false).into(),
        );
        record.insert("is_published".into(), self.is_published().into());
        record.insert(
            "estimated_duration_minutes".into(),
            self.estimated_duration_minutes
                .filter(|&m| m > 0)
                .unwrap_or(DEFAULT_DURATION_MINUTES)
                .into(),
        );
        record.insert(
            "author".into(),
            self.author
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or(DEFAULT_AUTHOR)
                .into(),
        );
        record.insert(
            "display_order".into(),
            self.display_order
                .filter(|&o| o != 0)
                .unwrap_or(DEFAULT_DISPLAY_ORDER)
                .into(),
        );
        record
    }

    /// Record for a new item; `published_at` is stamped when published
    pub fn to_insert_record(&self, now: DateTime<Utc>) -> Record {
        let mut record = self.columns();
        let published_at = if self.is_published() {
            Value::String(now.to_rfc3339())
        } else {
            Value::Null
        };
        record.insert("published_at".into(), published_at);
        record
    }

    /// Patch for an existing item; always stamps `updated_at`
    pub fn to_update_record(&self, now: DateTime<Utc>) -> Record {
        let mut record = self.columns();
        record.insert("updated_at".into(), Value::String(now.to_rfc3339()));
        record
    }
}

/// A content item as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub format: ContentFormat,
    #[serde(default)]
    pub content: Value,
    #[serde(default)]
    pub category_slug: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_premium: bool,
    #[serde(default = "default_true")]
    pub is_published: bool,
    #[serde(default = "default_duration")]
    pub estimated_duration_minutes: u32,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "default_display_order")]
    pub display_order: i64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

fn default_display_order() -> i64 {
    DEFAULT_DISPLAY_ORDER
}

impl ContentItem {
    pub fn from_record(record: &Record) -> Result<Self, ContentError> {
        serde_json::from_value(Value::Object(record.clone()))
            .map_err(|e| ContentError::Malformed(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContentError {
    #[error("Content ID is required")]
    MissingId,

    #[error("Slug and title are required")]
    MissingSlugOrTitle,

    #[error("A content item with this slug already exists")]
    DuplicateSlug(String),

    #[error("No content item with id {0}")]
    NotFound(String),

    #[error("Unknown content format: {0}")]
    UnknownFormat(String),

    #[error("Malformed content item: {0}")]
    Malformed(String),

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ContentError {
    fn from(e: StoreError) -> Self {
        match e {
            // Lost a race with another writer on the unique slug index
            StoreError::UniqueViolation { message } => ContentError::DuplicateSlug(message),
            other => ContentError::Store(other),
        }
    }
}

fn item_id(draft: &ContentDraft) -> Result<&str, ContentError> {
    draft
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(ContentError::MissingId)
}

/// Fail if another item (other than `exclude_id`) already uses `slug`
async fn ensure_slug_free<S: RecordStore>(
    store: &S,
    slug: &str,
    exclude_id: Option<&str>,
) -> Result<(), ContentError> {
    let mut query = Query::new().filter(Filter::eq("slug", slug)).limit(1);
    if let Some(id) = exclude_id {
        query = query.filter(Filter::neq("id", id));
    }
    let existing = store.select(CONTENT_ITEMS, &query).await?;
    if existing.is_empty() {
        Ok(())
    } else {
        Err(ContentError::DuplicateSlug(slug.to_string()))
    }
}

pub async fn create<S: RecordStore>(store: &S, draft: &ContentDraft) -> Result<ContentItem, ContentError> {
    draft.require_slug_and_title()?;
    ensure_slug_free(store, draft.slug.trim(), None).await?;

    let saved = store
        .insert(CONTENT_ITEMS, draft.to_insert_record(Utc::now()))
        .await?;
    let item = ContentItem::from_record(&saved)?;
    tracing::info!(id = %item.id, slug = %item.slug, "created content item");
    Ok(item)
}

pub async fn update<S: RecordStore>(store: &S, draft: &ContentDraft) -> Result<ContentItem, ContentError> {
    let id = item_id(draft)?;
    draft.require_slug_and_title()?;
    ensure_slug_free(store, draft.slug.trim(), Some(id)).await?;

    let updated = store
        .update(
            CONTENT_ITEMS,
            &[Filter::eq("id", id)],
            draft.to_update_record(Utc::now()),
        )
        .await?;

    let record = updated
        .into_iter()
        .next()
        .ok_or_else(|| ContentError::NotFound(id.to_string()))?;
    let item = ContentItem::from_record(&record)?;
    tracing::info!(id = %item.id, slug = %item.slug, "updated content item");
    Ok(item)
}

pub async fn delete<S: RecordStore>(store: &S, id: &str) -> Result<(), ContentError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(ContentError::MissingId);
    }
    let removed = store.delete(CONTENT_ITEMS, &[Filter::eq("id", id)]).await?;
    if removed == 0 {
        return Err(ContentError::NotFound(id.to_string()));
    }
    tracing::info!(id, "deleted content item");
    Ok(())
}

/// All items, lowest display order first
pub async fn list<S: RecordStore>(store: &S) -> Result<Vec<ContentItem>, ContentError> {
    let rows = store
        .select(CONTENT_ITEMS, &Query::new().order_by("display_order", true))
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        match ContentItem::from_record(row) {
            Ok(item) => items.push(item),
            Err(e) => tracing::warn!(error = %e, "skipping malformed content item"),
        }
    }
    Ok(items)
}
