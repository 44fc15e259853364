//! # Fleet Session
//!
//! An open store plus the user acting on it. Every command that touches the
//! database goes through a session, which checks the acting user's role
//! before any mutation.

use crate::config::Settings;
use crate::error::{CliError, Result};
use fleetpm_core::{Action, RedbFleet, TimestampMs, User};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// An open fleet store and the user acting on it.
pub struct FleetSession {
    store: RedbFleet,
    actor: User,
}

impl FleetSession {
    /// Open the database named in `settings` as its acting user.
    pub fn open(settings: &Settings) -> Result<Self> {
        if !settings.db_path.exists() {
            return Err(CliError::NotInitialized(
                settings.db_path.display().to_string(),
            ));
        }
        let store = RedbFleet::open(&settings.db_path)?;
        let actor = store
            .user_by_name(&settings.actor)?
            .ok_or_else(|| CliError::UnknownUser(settings.actor.clone()))?;
        debug!(db = %store.path().display(), user = %actor.username, role = %actor.role, "session opened");
        Ok(Self { store, actor })
    }

    /// Fail unless the acting user may perform `action`.
    pub fn require(&self, action: Action) -> Result<()> {
        if self.actor.role.permits(action) {
            Ok(())
        } else {
            warn!(user = %self.actor.username, role = %self.actor.role, %action, "permission denied");
            Err(CliError::Unauthorized {
                role: self.actor.role,
                action,
            })
        }
    }

    pub fn store(&self) -> &RedbFleet {
        &self.store
    }

    pub fn actor(&self) -> &User {
        &self.actor
    }
}

/// Wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> TimestampMs {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as TimestampMs)
        .unwrap_or(0)
}
