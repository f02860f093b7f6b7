use serde::{Deserialize, Serialize};
use std::fmt;

/// Role assigned to a user account.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to the panel, including user management.
    Admin,
    /// Elevated application privileges; cannot sign into the panel.
    Moderator,
    /// Regular account.
    #[default]
    User,
}

impl Role {
    /// Human-readable label shown in the UI.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Moderator => "Moderator",
            Role::User => "User",
        }
    }

    /// Parse from the string value stored by the record service.
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "moderator" => Some(Role::Moderator),
            "user" => Some(Role::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }

    /// CSS class for the role badge in the user table.
    pub fn badge_class(&self) -> &'static str {
        match self {
            Role::Admin => "badge badge-admin",
            Role::Moderator => "badge badge-moderator",
            Role::User => "badge badge-user",
        }
    }

    /// All valid roles, in display order.
    pub fn all() -> &'static [Role] {
        &[Role::Admin, Role::Moderator, Role::User]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
