//! Log subscriber setup.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::stderr_buffer::BufferedStderr;

/// Variable holding per-target log levels, e.g. `founder_check::store=debug`
pub const LOG_ENV_VAR: &str = "FOUNDER_CHECK_LOG";

static INIT: Once = Once::new();

/// Filter directives used when the environment does not provide any
pub fn default_directives(verbose: bool) -> &'static str {
    if verbose {
        "founder_check=debug"
    } else {
        "founder_check=warn"
    }
}

/// Initialize logging to stderr.
///
/// `FOUNDER_CHECK_LOG` overrides the level; otherwise `--verbose` selects
/// debug output. Lines go through the stderr buffer so they are held back
/// while the dashboard owns the screen. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

        let result = tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(BufferedStderr)
                    .with_target(verbose)
                    .with_ansi(false)
                    .without_time(),
            )
            .with(filter)
            .try_init();

        if let Err(e) = result {
            eprintln!("Warning: logging disabled: {}", e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(false), "founder_check=warn");
        assert_eq!(default_directives(true), "founder_check=debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_logging(false);
        init_logging(true);
    }
}
