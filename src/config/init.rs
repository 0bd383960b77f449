use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::config::{
    get_config_path, validate_config, Config, MailingListConfig, StoreBackend, StoreConfig,
    DEFAULT_REFRESH_INTERVAL,
};
use crate::credentials::{Secret, ENV_MAILING_KEY_VAR, ENV_STORE_KEY_VAR};
use crate::prompt::Prompter;

fn prompt_store<R: BufRead, W: Write>(p: &mut Prompter<R, W>) -> Result<StoreConfig> {
    p.typewriter("Quiz submissions and lesson content live in a record store.")?;
    p.typewriter("Use 'local' to keep them in a file on this machine, or 'supabase' for a hosted project.")?;

    let backend = loop {
        let input = p.prompt_with_default("Store backend (local/supabase)", "local")?;
        match input.to_lowercase().as_str() {
            "local" => break StoreBackend::Local,
            "supabase" => break StoreBackend::Supabase,
            _ => p.println("  Invalid: enter 'local' or 'supabase'. Try again.")?,
        }
    };

    let store = match backend {
        StoreBackend::Local => StoreConfig {
            backend,
            url: None,
            path: None,
        },
        StoreBackend::Supabase => {
            let url = loop {
                let url = p.prompt("  Project URL (e.g. https://abcd.supabase.co): ")?;
                if url.starts_with("https://") || url.starts_with("http://") {
                    break url;
                }
                p.println("  Invalid: the URL must start with https://. Try again.")?;
            };
            p.typewriter(&format!(
                "The project key is read from {} at run time; it is never written to the config.",
                ENV_STORE_KEY_VAR
            ))?;
            StoreConfig {
                backend,
                url: Some(url),
                path: None,
            }
        }
    };
    Ok(store)
}

fn prompt_mailing_list<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
) -> Result<Option<MailingListConfig>> {
    p.println("")?;
    p.typewriter("After seeing their results, respondents can join a Mailchimp audience.")?;
    if !p.prompt_yes_no("Configure the mailing list?", false)? {
        return Ok(None);
    }

    let server_prefix = loop {
        let s = p.prompt("  Server prefix (the 'us21' part of your API host): ")?;
        if !s.is_empty() {
            break s;
        }
        p.println("  Server prefix is required.")?;
    };
    let list_id = loop {
        let s = p.prompt("  Audience (list) id: ")?;
        if !s.is_empty() {
            break s;
        }
        p.println("  Audience id is required.")?;
    };
    let tag = p.prompt_optional("  Tag for new subscribers")?;

    p.typewriter(&format!(
        "The API key is read from {} at run time.",
        ENV_MAILING_KEY_VAR
    ))?;

    Ok(Some(MailingListConfig {
        server_prefix,
        list_id,
        tag,
    }))
}

/// Write `config` as YAML, replacing any existing file atomically
pub fn write_config(config: &Config, path: &Path) -> Result<()> {
    let yaml = serde_saphyr::to_string(config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    // Create parent directories
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the suggested config file path.
/// Returns the path written, or None if the user declined to overwrite.
pub fn run_init_wizard<R: BufRead, W: Write>(
    p: &mut Prompter<R, W>,
    default_path: Option<PathBuf>,
) -> Result<Option<PathBuf>> {
    p.println("")?;
    p.typewriter("Founder Check Configuration Wizard")?;
    p.println("==================================")?;
    p.println("")?;

    let store = prompt_store(p)?;
    let mailing_list = prompt_mailing_list(p)?;

    p.println("")?;
    let auto_refresh_interval = loop {
        let input = p.prompt_with_default(
            "Dashboard refresh interval in seconds (0 disables)",
            &DEFAULT_REFRESH_INTERVAL.to_string(),
        )?;
        match input.parse::<u64>() {
            Ok(v) if v == 0 || v >= 10 => break v,
            Ok(_) => p.println("  Invalid: use at least 10 seconds, or 0. Try again.")?,
            Err(_) => p.println("  Invalid: must be a whole number. Try again.")?,
        }
    };

    let config = Config {
        store,
        mailing_list,
        auto_refresh_interval,
    };
    if let Err(errors) = validate_config(&config) {
        anyhow::bail!("Config is invalid:\n  {}", errors.join("\n  "));
    }

    let default_config_path = default_path.unwrap_or_else(get_config_path);
    p.println("")?;
    let path_str = p.prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    if config_path.exists() {
        let overwrite = p.prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            p.println("Aborted.")?;
            return Ok(None);
        }
    }

    write_config(&config, &config_path)?;

    p.println("")?;
    p.println(&format!("Config written to {}", config_path.display()))?;
    if config.store.backend == StoreBackend::Supabase {
        p.println(&format!("Remember to export {}.", Secret::StoreKey.env_var()))?;
    }
    p.println("Run `founder-check` to take the quiz.")?;

    Ok(Some(config_path))
}
