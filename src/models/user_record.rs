use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::role::Role;

/// Identifier issued by the authentication service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub String);

/// Identifier of a metadata record in the user-record service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

macro_rules! impl_id {
    ($name:ident) => {
        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }
    };
}

impl_id!(IdentityId);
impl_id!(RecordId);

impl RecordId {
    /// Panel path for the edit page, with the id percent-encoded.
    pub fn edit_path(&self) -> String {
        format!("/users/{}/edit", urlencoding::encode(&self.0))
    }

    pub fn delete_path(&self) -> String {
        format!("/users/{}/delete", urlencoding::encode(&self.0))
    }
}

/// A record as returned by the user-record service. Timestamps may be absent
/// when the service has not resolved them yet.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub id: RecordId,
    pub auth_identity_id: IdentityId,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl StoredUser {
    /// Fill missing timestamps with `now`.
    pub fn normalize(self, now: DateTime<Utc>) -> UserRecord {
        let created_at = self.created_at.unwrap_or(now);
        let last_updated = self.last_updated.unwrap_or(now).max(created_at);
        UserRecord {
            id: self.id,
            auth_identity_id: self.auth_identity_id,
            email: self.email,
            role: self.role,
            created_at,
            last_updated,
        }
    }
}

/// A user as held by the directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: RecordId,
    pub auth_identity_id: IdentityId,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

/// Payload for creating a record. Timestamps are assigned by the service.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUserRecord {
    pub auth_identity_id: IdentityId,
    pub email: String,
    pub role: Role,
}

/// Partial update applied to a record. `last_updated` is always refreshed by
/// the service.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}
