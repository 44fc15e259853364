//! # Configuration
//!
//! Runtime settings resolved from command-line flags and environment
//! variables, and the tracing subscriber setup.

use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Database used when neither `--db` nor `FLEETPM_DB` is given.
pub const DEFAULT_DB_PATH: &str = "fleet.redb";

/// Acting user when neither `--as` nor `FLEETPM_USER` is given.
pub const DEFAULT_ACTOR: &str = "admin";

/// Settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Path of the redb database file.
    pub db_path: PathBuf,
    /// Username of the acting user.
    pub actor: String,
    /// Print results as JSON instead of text.
    pub json: bool,
}

impl Settings {
    pub fn new(db_path: impl Into<PathBuf>, actor: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            actor: actor.into(),
            json: false,
        }
    }

    #[must_use]
    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so command output on stdout stays parseable. `RUST_LOG`
/// overrides the level picked from `verbose` (0 = warn, 1 = info, 2+ = debug).
/// Returns `false` when a subscriber was already installed; that one is kept.
pub fn init_tracing(verbose: u8) -> bool {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if let Err(err) = installed {
        debug!(error = %err, "tracing subscriber already installed");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_to_text_output() {
        let settings = Settings::new("x.redb", "ana");
        assert!(!settings.json);
        assert!(settings.with_json(true).json);
    }

    #[test]
    fn second_tracing_init_keeps_first_subscriber() {
        init_tracing(0);
        assert!(!init_tracing(2));
    }
}
