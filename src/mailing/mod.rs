pub mod mailchimp;

pub use mailchimp::MailchimpClient;

use std::future::Future;

/// Someone joining the mailing list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub tags: Vec<String>,
}

impl Subscriber {
    pub fn new(email: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            email: email.trim().to_string(),
            first_name: first_name.trim().to_string(),
            last_name: last_name.trim().to_string(),
            tags: Vec::new(),
        }
    }

    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        if let Some(tag) = tag.map(str::trim).filter(|t| !t.is_empty()) {
            self.tags.push(tag.to_string());
        }
        self
    }

    /// Names of required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.email.is_empty() {
            missing.push("email");
        }
        if self.first_name.is_empty() {
            missing.push("first name");
        }
        if self.last_name.is_empty() {
            missing.push("last name");
        }
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscribeError {
    #[error("required subscriber fields are empty: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("address is already on the list")]
    AlreadySubscribed,

    #[error("address was rejected as invalid: {detail}")]
    InvalidAddress { detail: String },

    #[error("mailing list rejected the API credentials (HTTP {status})")]
    AuthenticationFailed { status: u16 },

    #[error("mailing list request failed: {detail}")]
    Other { detail: String },
}

impl SubscribeError {
    /// Message safe to show the person subscribing
    pub fn user_message(&self) -> &'static str {
        match self {
            SubscribeError::MissingFields(_) => "Please fill in all fields to continue",
            SubscribeError::AlreadySubscribed => {
                "Good news! You're already subscribed to our mailing list."
            }
            SubscribeError::InvalidAddress { .. } => "Please enter a valid email address",
            SubscribeError::AuthenticationFailed { .. } => {
                "Oops! Something went wrong. Please try again later."
            }
            SubscribeError::Other { .. } => "Something went wrong. Please try again in a moment.",
        }
    }
}

/// Identifier the mailing list assigned to a new subscriber
pub type SubscriberId = String;

pub trait MailingList {
    fn add_subscriber(
        &self,
        subscriber: &Subscriber,
    ) -> impl Future<Output = Result<SubscriberId, SubscribeError>> + Send;
}
