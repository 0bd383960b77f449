pub mod init;
mod schema;
mod validation;

pub use schema::{
    Config, MailingListConfig, StoreBackend, StoreConfig, DEFAULT_REFRESH_INTERVAL,
};
pub use validation::validate_config;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (~/.config/founder-check/)
pub fn get_config_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".config").join("founder-check")
}

/// Get the default config file path (~/.config/founder-check/config.yaml)
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.yaml")
}

/// Load configuration from a YAML file
///
/// With no explicit `path`, a missing default file yields the default
/// configuration (local store, no mailing list).
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given config file does not exist
/// - The config file cannot be read
/// - The YAML cannot be parsed or has unknown keys
pub fn load_config(path: Option<PathBuf>) -> Result<Config> {
    let explicit = path.is_some();
    let config_path = path.unwrap_or_else(get_config_path);

    if !config_path.exists() {
        if explicit {
            anyhow::bail!(
                "Config file not found at {}. Run `founder-check init` to create one",
                config_path.display()
            );
        }
        tracing::debug!(path = %config_path.display(), "no config file, using defaults");
        return Ok(Config::default());
    }

    parse_config_file(&config_path)
}

fn parse_config_file(config_path: &Path) -> Result<Config> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;

    let config: Config = serde_saphyr::from_str(&config_content)
        .with_context(|| format!("Failed to parse config: invalid YAML in {}", config_path.display()))?;

    tracing::debug!(path = %config_path.display(), backend = ?config.store.backend, "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_name() {
        assert!(get_config_dir().ends_with(".config/founder-check"));
        assert!(get_config_path().ends_with("founder-check/config.yaml"));
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(dir.path().join("nope.yaml"))).unwrap_err();
        assert!(err.to_string().contains("founder-check init"));
    }

    #[test]
    fn test_parses_full_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "store:\n  backend: supabase\n  url: https://abcd.supabase.co\nmailing_list:\n  server_prefix: us21\n  list_id: a1b2c3\n  tag: quiz\nauto_refresh_interval: 60\n",
        )
        .unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Supabase);
        assert_eq!(config.store.url.as_deref(), Some("https://abcd.supabase.co"));
        let mailing = config.mailing_list.unwrap();
        assert_eq!(mailing.server_prefix, "us21");
        assert_eq!(mailing.tag.as_deref(), Some("quiz"));
        assert_eq!(config.auto_refresh_interval, 60);
    }

    #[test]
    fn test_minimal_config_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "store:\n  backend: local\n").unwrap();

        let config = load_config(Some(path)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "queries: []\n").unwrap();
        assert!(load_config(Some(path)).is_err());
    }
}
