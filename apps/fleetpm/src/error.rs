//! Application errors.

use fleetpm_core::{Action, FleetError, Role};
use thiserror::Error;

pub type Result<T, E = CliError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Fleet(#[from] FleetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The acting user's role does not permit the action.
    #[error("permission denied: role {role} may not {action}")]
    Unauthorized { role: Role, action: Action },

    #[error("unknown user: {0}")]
    UnknownUser(String),

    #[error("database {0} already exists (use --force to overwrite)")]
    AlreadyExists(String),

    #[error("database {0} not found (run `fleetpm init` first)")]
    NotInitialized(String),

    #[error("unsupported format: {0} (expected canonical or json)")]
    UnsupportedFormat(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
