use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{MailingList, SubscribeError, Subscriber, SubscriberId};

/// Problem document Mailchimp returns on failed requests
#[derive(Debug, Default, Deserialize)]
struct MailchimpProblem {
    status: Option<u16>,
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Serialize)]
struct MergeFields<'a> {
    #[serde(rename = "FNAME")]
    first_name: &'a str,
    #[serde(rename = "LNAME")]
    last_name: &'a str,
}

#[derive(Debug, Serialize)]
struct AddMember<'a> {
    email_address: &'a str,
    status: &'a str,
    merge_fields: MergeFields<'a>,
    tags: &'a [String],
}

#[derive(Debug, Deserialize)]
struct Member {
    id: String,
}

/// Mailchimp Marketing API client for one audience (list)
#[derive(Clone)]
pub struct MailchimpClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    list_id: String,
}

impl MailchimpClient {
    /// `server_prefix` is the data-center part of the API host, e.g. "us21"
    pub fn new(api_key: &str, server_prefix: &str, list_id: &str) -> Result<Self> {
        let base_url = format!("https://{}.api.mailchimp.com/3.0", server_prefix.trim());
        Self::with_base_url(api_key, &base_url, list_id)
    }

    pub fn with_base_url(api_key: &str, base_url: &str, list_id: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent(concat!("founder-check/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client for the mailing list")?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            list_id: list_id.to_string(),
        })
    }

    fn members_url(&self) -> String {
        format!("{}/lists/{}/members", self.base_url, self.list_id)
    }
}

/// Map a failed Mailchimp response to a typed error
pub(crate) fn classify_failure(status: StatusCode, body: &str) -> SubscribeError {
    let problem: MailchimpProblem = serde_json::from_str(body).unwrap_or_default();
    let status_code = problem.status.unwrap_or(status.as_u16());
    let title = problem.title.as_deref().unwrap_or("");
    let detail = problem
        .detail
        .clone()
        .unwrap_or_else(|| format!("HTTP {}", status_code));

    tracing::warn!(
        status = status_code,
        title,
        detail = %detail,
        "mailing list subscription failed"
    );

    match (status_code, title) {
        (400, "Member Exists") => SubscribeError::AlreadySubscribed,
        (400, "Invalid Resource") => SubscribeError::InvalidAddress { detail },
        (401 | 403, _) => {
            tracing::error!("authentication error, check mailing list API credentials");
            SubscribeError::AuthenticationFailed {
                status: status_code,
            }
        }
        _ => SubscribeError::Other { detail },
    }
}

impl MailingList for MailchimpClient {
    async fn add_subscriber(&self, subscriber: &Subscriber) -> Result<SubscriberId, SubscribeError> {
        let missing = subscriber.missing_fields();
        if !missing.is_empty() {
            return Err(SubscribeError::MissingFields(missing));
        }

        let body = AddMember {
            email_address: &subscriber.email,
            status: "subscribed",
            merge_fields: MergeFields {
                first_name: &subscriber.first_name,
                last_name: &subscriber.last_name,
            },
            tags: &subscriber.tags,
        };

        // Mailchimp accepts any username with the API key as password
        let response = self
            .client
            .post(self.members_url())
            .basic_auth("founder-check", Some(&self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| SubscribeError::Other {
                detail: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| SubscribeError::Other {
            detail: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(classify_failure(status, &text));
        }

        let member: Member = serde_json::from_str(&text).map_err(|e| SubscribeError::Other {
            detail: format!("unexpected response body: {}", e),
        })?;

        tracing::info!(subscriber_id = %member.id, "added mailing list subscriber");
        Ok(member.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_url() {
        let client = MailchimpClient::new("key-us21", "us21", "abc123").unwrap();
        assert_eq!(
            client.members_url(),
            "https://us21.api.mailchimp.com/3.0/lists/abc123/members"
        );
    }

    #[test]
    fn test_classify_member_exists() {
        let body = r#"{"status":400,"title":"Member Exists","detail":"ada@example.com is already a list member."}"#;
        assert_eq!(
            classify_failure(StatusCode::BAD_REQUEST, body),
            SubscribeError::AlreadySubscribed
        );
    }

    #[test]
    fn test_classify_invalid_resource() {
        let body = r#"{"status":400,"title":"Invalid Resource","detail":"Please provide a valid email address."}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, body),
            SubscribeError::InvalidAddress { .. }
        ));
    }

    #[test]
    fn test_classify_auth_failures() {
        assert_eq!(
            classify_failure(StatusCode::UNAUTHORIZED, "{}"),
            SubscribeError::AuthenticationFailed { status: 401 }
        );
        assert_eq!(
            classify_failure(StatusCode::FORBIDDEN, ""),
            SubscribeError::AuthenticationFailed { status: 403 }
        );
    }

    #[test]
    fn test_classify_other() {
        let err = classify_failure(StatusCode::INTERNAL_SERVER_ERROR, "oops");
        assert_eq!(
            err,
            SubscribeError::Other {
                detail: "HTTP 500".to_string()
            }
        );
        // 400 with an unrecognized title is not an address problem
        let body = r#"{"status":400,"title":"Forgotten Email Not Subscribed"}"#;
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, body),
            SubscribeError::Other { .. }
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let tags = vec!["quiz".to_string()];
        let body = AddMember {
            email_address: "ada@example.com",
            status: "subscribed",
            merge_fields: MergeFields {
                first_name: "Ada",
                last_name: "Lovelace",
            },
            tags: &tags,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["merge_fields"]["FNAME"], "Ada");
        assert_eq!(value["merge_fields"]["LNAME"], "Lovelace");
        assert_eq!(value["status"], "subscribed");
        assert_eq!(value["tags"][0], "quiz");
    }

    #[tokio::test]
    async fn test_missing_fields_rejected_before_request() {
        // Unroutable base URL: the call must fail before any request is sent
        let client = MailchimpClient::with_base_url("key", "http://127.0.0.1:9", "list").unwrap();
        let err = client
            .add_subscriber(&Subscriber::new("", "Ada", "Lovelace"))
            .await
            .unwrap_err();
        assert_eq!(err, SubscribeError::MissingFields(vec!["email"]));
    }
}
