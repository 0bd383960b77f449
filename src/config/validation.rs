use regex::Regex;
use std::sync::LazyLock;

use super::schema::{Config, StoreBackend};

static SERVER_PREFIX_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[a-z]{2,}[0-9]+$").ok());

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    match config.store.backend {
        StoreBackend::Supabase => match config.store.url.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push("store.url: required when store.backend is 'supabase'".to_string())
            }
            Some(url) if !(url.starts_with("https://") || url.starts_with("http://")) => {
                errors.push(format!(
                    "store.url: invalid '{}' - must start with https://",
                    url
                ))
            }
            Some(_) => {}
        },
        StoreBackend::Local => {
            if config.store.url.is_some() {
                errors.push("store.url: only used when store.backend is 'supabase'".to_string());
            }
        }
    }

    if config.store.backend == StoreBackend::Supabase && config.store.path.is_some() {
        errors.push("store.path: only used when store.backend is 'local'".to_string());
    }

    if let Some(ref mailing) = config.mailing_list {
        let prefix = mailing.server_prefix.trim();
        let prefix_ok = SERVER_PREFIX_RE
            .as_ref()
            .map(|re| re.is_match(prefix))
            .unwrap_or(!prefix.is_empty());
        if !prefix_ok {
            errors.push(format!(
                "mailing_list.server_prefix: invalid '{}' - expected a data center like 'us21'",
                mailing.server_prefix
            ));
        }
        if mailing.list_id.trim().is_empty() {
            errors.push("mailing_list.list_id: must not be empty".to_string());
        }
        if let Some(ref tag) = mailing.tag {
            if tag.trim().is_empty() {
                errors.push("mailing_list.tag: must not be blank when set".to_string());
            }
        }
    }

    if config.auto_refresh_interval != 0 && config.auto_refresh_interval < 10 {
        errors.push(format!(
            "auto_refresh_interval: {} is too short - use at least 10 seconds, or 0 to disable",
            config.auto_refresh_interval
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MailingListConfig, StoreConfig};

    fn supabase(url: Option<&str>) -> Config {
        Config {
            store: StoreConfig {
                backend: StoreBackend::Supabase,
                url: url.map(str::to_string),
                path: None,
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_supabase_requires_url() {
        let errors = validate_config(&supabase(None)).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("store.url"));

        assert!(validate_config(&supabase(Some("abcd.supabase.co"))).is_err());
        assert!(validate_config(&supabase(Some("https://abcd.supabase.co"))).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let config = Config {
            mailing_list: Some(MailingListConfig {
                server_prefix: "mailchimp".to_string(),
                list_id: " ".to_string(),
                tag: Some("".to_string()),
            }),
            auto_refresh_interval: 3,
            ..supabase(None)
        };
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{:?}", errors);
    }

    #[test]
    fn test_valid_mailing_list() {
        let config = Config {
            mailing_list: Some(MailingListConfig {
                server_prefix: "us21".to_string(),
                list_id: "a1b2c3".to_string(),
                tag: Some("readiness-quiz".to_string()),
            }),
            ..Config::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_refresh_interval_zero_disables() {
        let config = Config {
            auto_refresh_interval: 0,
            ..Config::default()
        };
        assert!(validate_config(&config).is_ok());
    }
}
