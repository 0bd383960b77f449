//! Collection-based record storage.
//!
//! The hosted store is a PostgREST endpoint (Supabase); `LocalStore` keeps
//! the same collections in a JSON file for offline runs and tests.

pub mod local;
pub mod supabase;

pub use local::LocalStore;
pub use supabase::SupabaseStore;

use crate::config::{StoreBackend, StoreConfig};

use serde_json::Value;
use std::cmp::Ordering;
use std::future::Future;

/// Quiz submissions
pub const SUBMISSIONS: &str = "web_test_responses";

/// Lesson content items
pub const CONTENT_ITEMS: &str = "content_items";

/// Mobile app accounts
pub const APP_USERS: &str = "users";

/// Assessments taken in the mobile app, including retakes
pub const APP_ATTEMPTS: &str = "test_responses";

pub const LESSON_COMPLETIONS: &str = "user_lesson_completions";

/// A stored row: a JSON object keyed by column name
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Neq,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: value.into(),
        }
    }

    pub fn neq(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Neq,
            value: value.into(),
        }
    }

    /// Whether a record satisfies this filter. A missing field compares as null.
    pub fn matches(&self, record: &Record) -> bool {
        let actual = record.get(&self.field).unwrap_or(&Value::Null);
        let equal = values_equal(actual, &self.value);
        match self.op {
            FilterOp::Eq => equal,
            FilterOp::Neq => !equal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub field: String,
    pub ascending: bool,
}

/// Read options for `RecordStore::select`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, field: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            field: field.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("unique constraint violated: {message}")]
    UniqueViolation { message: String },

    #[error("check constraint violated: {message}")]
    CheckViolation { message: String },

    #[error("store unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("store request failed: {message}")]
    Other { message: String },
}

/// Postgres SQLSTATE for unique_violation
pub const PG_UNIQUE_VIOLATION: &str = "23505";

/// Postgres SQLSTATE for check_violation
pub const PG_CHECK_VIOLATION: &str = "23514";

impl StoreError {
    /// Classify a failure by its Postgres error code
    pub fn from_code(code: Option<&str>, message: String) -> Self {
        match code {
            Some(PG_UNIQUE_VIOLATION) => StoreError::UniqueViolation { message },
            Some(PG_CHECK_VIOLATION) => StoreError::CheckViolation { message },
            _ => StoreError::Other { message },
        }
    }

    /// Worth retrying: the request may succeed if sent again
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable { .. })
    }
}

/// Create/read/update/delete against named collections.
pub trait RecordStore {
    /// Insert one record and return it as stored (with id and timestamps)
    fn insert(
        &self,
        collection: &str,
        record: Record,
    ) -> impl Future<Output = Result<Record, StoreError>> + Send;

    fn select(
        &self,
        collection: &str,
        query: &Query,
    ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// Merge `patch` into every record matching all `filters`
    fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: Record,
    ) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// Delete every record matching all `filters`; returns how many went
    fn delete(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;
}

/// Either backend, chosen from the config at startup
pub enum AnyStore {
    Local(LocalStore),
    Supabase(SupabaseStore),
}

impl AnyStore {
    /// Build the configured backend. The hosted backend needs `api_key`.
    pub fn from_config(config: &StoreConfig, api_key: Option<&str>) -> anyhow::Result<Self> {
        match config.backend {
            StoreBackend::Local => {
                let path = config
                    .path
                    .clone()
                    .unwrap_or_else(local::get_local_store_path);
                tracing::debug!(path = %path.display(), "using local store");
                Ok(AnyStore::Local(LocalStore::new(path)))
            }
            StoreBackend::Supabase => {
                let url = config
                    .url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.url is required for the supabase backend"))?;
                let key = api_key
                    .ok_or_else(|| anyhow::anyhow!("an API key is required for the supabase backend"))?;
                tracing::debug!(url, "using supabase store");
                Ok(AnyStore::Supabase(SupabaseStore::new(url, key)?))
            }
        }
    }

    /// Where records go, for messages
    pub fn describe(&self) -> String {
        match self {
            AnyStore::Local(s) => s.path().display().to_string(),
            AnyStore::Supabase(s) => s.base_url().to_string(),
        }
    }
}

impl RecordStore for AnyStore {
    async fn insert(&self, collection: &str, record: Record) -> Result<Record, StoreError> {
        match self {
            AnyStore::Local(s) => s.insert(collection, record).await,
            AnyStore::Supabase(s) => s.insert(collection, record).await,
        }
    }

    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        match self {
            AnyStore::Local(s) => s.select(collection, query).await,
            AnyStore::Supabase(s) => s.select(collection, query).await,
        }
    }

    async fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: Record,
    ) -> Result<Vec<Record>, StoreError> {
        match self {
            AnyStore::Local(s) => s.update(collection, filters, patch).await,
            AnyStore::Supabase(s) => s.update(collection, filters, patch).await,
        }
    }

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<usize, StoreError> {
        match self {
            AnyStore::Local(s) => s.delete(collection, filters).await,
            AnyStore::Supabase(s) => s.delete(collection, filters).await,
        }
    }
}

/// Equality across JSON values, treating numbers numerically (1 == 1.0)
pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

/// Total order used for sorting: nulls first, then booleans, numbers, strings
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&y.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
