//! # Access Contract
//!
//! Roles and the actions each role may perform. Callers check
//! [`Role::permits`] before invoking a store operation; the store itself is
//! role-agnostic.

use crate::error::FleetError;
use crate::types::{TimestampMs, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Full control ("Administrador").
    Administrator,
    /// Day-to-day operation ("Instructor" / "Usuario").
    Operator,
    /// Read-only ("Visor").
    Viewer,
}

/// Something a user may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    ViewFleet,
    CreateMachine,
    EditMachine,
    DeleteMachine,
    Refuel,
    RegisterMaintenance,
    ManageKits,
    OperateJobs,
    ManageUsers,
    CreateSupply,
    RestockSupply,
    EditSupply,
    DeleteSupply,
    ImportData,
}

impl Role {
    /// Whether this role may perform `action`.
    #[must_use]
    pub fn permits(self, action: Action) -> bool {
        match self {
            Role::Administrator => true,
            Role::Operator => matches!(
                action,
                Action::ViewFleet
                    | Action::CreateMachine
                    | Action::Refuel
                    | Action::RegisterMaintenance
                    | Action::OperateJobs
                    | Action::CreateSupply
                    | Action::RestockSupply
            ),
            Role::Viewer => action == Action::ViewFleet,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Administrator => "Administrador",
            Role::Operator => "Instructor",
            Role::Viewer => "Visor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "administrador" | "administrator" | "admin" => Ok(Role::Administrator),
            "instructor" | "usuario" | "operator" => Ok(Role::Operator),
            "visor" | "viewer" => Ok(Role::Viewer),
            _ => Err(FleetError::InvalidRole(s.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::ViewFleet => "view fleet",
            Action::CreateMachine => "create machines",
            Action::EditMachine => "edit machines",
            Action::DeleteMachine => "delete machines",
            Action::Refuel => "refuel",
            Action::RegisterMaintenance => "register maintenance",
            Action::ManageKits => "manage PM kits",
            Action::OperateJobs => "operate jobs",
            Action::ManageUsers => "manage users",
            Action::CreateSupply => "create supplies",
            Action::RestockSupply => "restock supplies",
            Action::EditSupply => "edit supplies",
            Action::DeleteSupply => "delete supplies",
            Action::ImportData => "import data",
        };
        f.write_str(name)
    }
}

/// A user account. Credentials are handled outside fleetpm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub created_at_ms: TimestampMs,
}

// =============================================================================
// TESTS
// =============================================================================
