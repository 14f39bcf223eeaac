use crate::identifiers::{Email, IdentityId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an identity; governs which operations a consumer permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Ordinary user: manages their own events.
    #[default]
    User,
    /// Administrator: manages the taxonomy and may delete any event.
    Admin,
}

impl Role {
    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

/// An authenticated principal. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable identity id.
    pub id: IdentityId,
    /// Login email.
    pub email: String,
    /// Role fixed at registration.
    pub role: Role,
}

impl Identity {
    /// True if this identity is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Configurable role assignment.
///
/// Registration grants admin when the caller asked for it and
/// `allow_requested_admin` is set, or when the email ends with one of
/// `admin_email_suffixes`. The suffix rule is also the fallback on login when
/// no role was persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RolePolicy {
    /// Honour an explicit admin request at registration.
    pub allow_requested_admin: bool,
    /// Email suffixes (e.g. `@admin.com`) that always resolve to admin.
    pub admin_email_suffixes: Vec<String>,
}

impl Default for RolePolicy {
    fn default() -> Self {
        Self {
            allow_requested_admin: true,
            admin_email_suffixes: Vec::new(),
        }
    }
}

impl RolePolicy {
    /// Resolves the role to store for a new registration.
    pub fn resolve_registration(&self, email: &Email, requested: Role) -> Role {
        if requested == Role::Admin && self.allow_requested_admin {
            return Role::Admin;
        }
        self.resolve_fallback(email.as_str())
    }

    /// Role for an identity whose profile carries no role.
    pub fn resolve_fallback(&self, email: &str) -> Role {
        let email = email.trim().to_ascii_lowercase();
        let admin = self
            .admin_email_suffixes
            .iter()
            .filter(|s| !s.trim().is_empty())
            .any(|s| email.ends_with(&s.trim().to_ascii_lowercase()));
        if admin {
            Role::Admin
        } else {
            Role::User
        }
    }
}
