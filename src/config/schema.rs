use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Seconds between dashboard reloads when not set in the config
pub const DEFAULT_REFRESH_INTERVAL: u64 = 300;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mailing_list: Option<MailingListConfig>,
    /// Dashboard reload interval in seconds, 0 disables reloading
    #[serde(default = "default_refresh_interval")]
    pub auto_refresh_interval: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            mailing_list: None,
            auto_refresh_interval: DEFAULT_REFRESH_INTERVAL,
        }
    }
}

fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// JSON file on this machine
    #[default]
    Local,
    /// Hosted Supabase project
    Supabase,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// Project URL, e.g. https://abcd.supabase.co (supabase backend)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Store file (local backend); defaults to ~/.config/founder-check/store.json
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MailingListConfig {
    /// Mailchimp data center, e.g. "us21"
    pub server_prefix: String,
    /// Audience id
    pub list_id: String,
    /// Tag applied to every new subscriber
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}
