use anyhow::{Context, Result};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tokio_retry::{strategy::ExponentialBackoff, RetryIf};

use super::{Filter, FilterOp, Query, Record, RecordStore, StoreError};

const MAX_RETRIES: usize = 3;

/// Error body PostgREST returns on failed requests
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    code: Option<String>,
    message: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// Record store talking to a Supabase project's PostgREST API
#[derive(Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseStore {
    pub fn new(url: &str, api_key: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("founder-check/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client for the record store")?;

        Ok(Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, collection: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, collection)
    }

    fn request(&self, method: Method, collection: &str) -> RequestBuilder {
        self.client
            .request(method, self.endpoint(collection))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
    }

    /// Send a request built by `build`. Transient failures are retried only
    /// when `retry` is set; writes are sent once.
    async fn send<F>(&self, build: F, retry: bool) -> Result<Vec<Record>, StoreError>
    where
        F: Fn() -> RequestBuilder,
    {
        RetryIf::start(
            retry_strategy(retry),
            || {
                let request = build();
                async move {
                    let response = request.send().await.map_err(transport_error)?;
                    let status = response.status();
                    let body = response.text().await.map_err(transport_error)?;

                    if status.is_success() {
                        parse_rows(&body)
                    } else {
                        Err(classify_response(status, &body))
                    }
                }
            },
            |e: &StoreError| {
                let transient = e.is_transient();
                if transient {
                    tracing::debug!(error = %e, "retrying record store request");
                }
                transient
            },
        )
        .await
    }
}

/// Delays between attempts: exponential backoff with up to 3 retries after
/// the first attempt, or none at all
fn retry_strategy(retry: bool) -> impl Iterator<Item = Duration> {
    let retries = if retry { MAX_RETRIES } else { 0 };
    ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(5))
        .take(retries)
}

fn transport_error(e: reqwest::Error) -> StoreError {
    StoreError::Unavailable {
        reason: e.to_string(),
    }
}

fn parse_rows(body: &str) -> Result<Vec<Record>, StoreError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect()),
        Ok(Value::Object(map)) => Ok(vec![map]),
        Ok(_) => Ok(Vec::new()),
        Err(e) => Err(StoreError::Other {
            message: format!("unexpected response body: {}", e),
        }),
    }
}

/// Map a non-2xx PostgREST response to a store error
pub(crate) fn classify_response(status: StatusCode, body: &str) -> StoreError {
    let error: PostgrestError = serde_json::from_str(body).unwrap_or_default();

    tracing::warn!(
        status = status.as_u16(),
        code = error.code.as_deref().unwrap_or(""),
        message = error.message.as_deref().unwrap_or(""),
        details = error.details.as_deref().unwrap_or(""),
        hint = error.hint.as_deref().unwrap_or(""),
        "record store request failed"
    );

    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return StoreError::Unavailable {
            reason: format!("HTTP {}", status.as_u16()),
        };
    }

    let message = error
        .message
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    StoreError::from_code(error.code.as_deref(), message)
}

/// PostgREST query parameter for one filter, e.g. ("slug", "eq.intro")
pub(crate) fn filter_param(filter: &Filter) -> (String, String) {
    // PostgREST matches nulls with `is`, not `eq`
    let op = match (filter.op, filter.value.is_null()) {
        (FilterOp::Eq, false) => "eq",
        (FilterOp::Neq, false) => "neq",
        (FilterOp::Eq, true) => "is",
        (FilterOp::Neq, true) => "not.is",
    };
    let value = match &filter.value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    };
    (filter.field.clone(), format!("{}.{}", op, value))
}

/// All query parameters for a select
pub(crate) fn query_params(query: &Query) -> Vec<(String, String)> {
    let mut params = vec![("select".to_string(), "*".to_string())];
    params.extend(query.filters.iter().map(filter_param));
    if let Some(order) = &query.order {
        let direction = if order.ascending { "asc" } else { "desc" };
        params.push(("order".to_string(), format!("{}.{}", order.field, direction)));
    }
    if let Some(limit) = query.limit {
        params.push(("limit".to_string(), limit.to_string()));
    }
    params
}

impl RecordStore for SupabaseStore {
    async fn insert(&self, collection: &str, record: Record) -> Result<Record, StoreError> {
        let build = || {
            self.request(Method::POST, collection)
                .header("Prefer", "return=representation")
                .json(&record)
        };
        let rows = self.send(build, false).await?;

        rows.into_iter().next().ok_or_else(|| StoreError::Other {
            message: "insert returned no record".to_string(),
        })
    }

    async fn select(&self, collection: &str, query: &Query) -> Result<Vec<Record>, StoreError> {
        let params = query_params(query);
        self.send(|| self.request(Method::GET, collection).query(&params), true)
            .await
    }

    async fn update(
        &self,
        collection: &str,
        filters: &[Filter],
        patch: Record,
    ) -> Result<Vec<Record>, StoreError> {
        let params: Vec<_> = filters.iter().map(filter_param).collect();
        let build = || {
            self.request(Method::PATCH, collection)
                .header("Prefer", "return=representation")
                .query(&params)
                .json(&patch)
        };
        self.send(build, false).await
    }

    async fn delete(&self, collection: &str, filters: &[Filter]) -> Result<usize, StoreError> {
        let params: Vec<_> = filters.iter().map(filter_param).collect();
        let build = || {
            self.request(Method::DELETE, collection)
                .header("Prefer", "return=representation")
                .query(&params)
        };
        let rows = self.send(build, false).await?;
        Ok(rows.len())
    }
}
