pub mod prompt;

/// Environment variable holding the Supabase API key
pub const ENV_STORE_KEY_VAR: &str = "SUPABASE_KEY";

/// Environment variable holding the Mailchimp API key
pub const ENV_MAILING_KEY_VAR: &str = "MAILCHIMP_API_KEY";

// Re-export prompt functions for convenience
pub use prompt::{prompt_for_secret, resolve_secret};

/// A secret the binary needs from its environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Secret {
    StoreKey,
    MailingListKey,
}

impl Secret {
    pub fn env_var(&self) -> &'static str {
        match self {
            Secret::StoreKey => ENV_STORE_KEY_VAR,
            Secret::MailingListKey => ENV_MAILING_KEY_VAR,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Secret::StoreKey => "Supabase API key",
            Secret::MailingListKey => "Mailchimp API key",
        }
    }
}

/// Read a value from an environment variable.
/// Returns Some(value) if the env var is set and non-empty, None otherwise.
pub fn get_from_env(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(val) => {
            let trimmed = val.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        }
        Err(_) => None,
    }
}

/// Look up `secret` in its environment variable
pub fn get_secret(secret: Secret) -> Result<String, CredentialError> {
    get_from_env(secret.env_var()).ok_or(CredentialError::NotSet(secret))
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("{} not found: set {}", .0.description(), .0.env_var())]
    NotSet(Secret),

    #[error("{} cannot be empty", .0.description())]
    Empty(Secret),
}
