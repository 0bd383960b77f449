use anyhow::{Context, Result};
use std::io::IsTerminal;

use super::{get_secret, CredentialError, Secret};

/// Prompts for a secret without echoing it
pub fn prompt_for_secret(secret: Secret) -> Result<String> {
    eprintln!("{} required.", secret.description());
    eprintln!(
        "Set {} to skip this prompt next time.",
        secret.env_var()
    );
    eprintln!();

    let value = rpassword::prompt_password(format!("Enter {}: ", secret.description()))
        .context("Failed to read secret from the terminal")?;

    let value = value.trim();
    if value.is_empty() {
        return Err(CredentialError::Empty(secret).into());
    }

    Ok(value.to_string())
}

/// Secret from the environment, or from a prompt when `interactive` and
/// stdin is a terminal
pub fn resolve_secret(secret: Secret, interactive: bool) -> Result<String> {
    match get_secret(secret) {
        Ok(value) => Ok(value),
        Err(_) if interactive && std::io::stdin().is_terminal() => {
            tracing::debug!(var = secret.env_var(), "secret not in environment, prompting");
            prompt_for_secret(secret)
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_non_interactive_reports_variable() {
        // The store key is not set in the test environment
        if std::env::var(Secret::StoreKey.env_var()).is_ok() {
            return;
        }
        let err = resolve_secret(Secret::StoreKey, false).unwrap_err();
        assert!(err.to_string().contains("SUPABASE_KEY"));
    }
}
