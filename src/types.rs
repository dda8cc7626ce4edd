/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of the signed-in principal.
///
/// `Unknown` covers both "role lookup still in flight" and "no role row". It is
/// a distinct state: code that gates on admin rights must not read it as
/// `Cashier`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Unknown,
    Admin,
    Cashier,
}

impl Role {
    /// `Some(true)` for admins, `Some(false)` for cashiers, `None` while unresolved.
    pub fn is_admin(&self) -> Option<bool> {
        match self {
            Role::Admin => Some(true),
            Role::Cashier => Some(false),
            Role::Unknown => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Role::Unknown)
    }

    /// Parse the value stored in the `users_roles.role` column.
    pub fn from_stored(value: &str) -> Self {
        match value {
            "admin" => Role::Admin,
            "cashier" => Role::Cashier,
            _ => Role::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
            Role::Unknown => "unknown",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Role::from_stored(&s.to_ascii_lowercase()) {
            Role::Unknown => Err(format!("unknown role '{}', expected admin or cashier", s)),
            role => Ok(role),
        }
    }
}

/// Product mutations recorded in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Insert,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Insert => "INSERT",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
        }
    }

    pub fn from_stored(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "INSERT" => Some(Operation::Insert),
            "UPDATE" => Some(Operation::Update),
            "DELETE" => Some(Operation::Delete),
            _ => None,
        }
    }
}

/// Identity attached to a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: Uuid,
    pub email: String,
}

/// Authenticated session handed out by the auth backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
    pub user: SessionUser,
}
