use serde::{Deserialize, Serialize};

use super::user_record::UserRecord;

/// Display row for the user table and the edit/delete pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub role: String,
    pub role_label: String,
    pub badge_class: String,
    pub created_at: String,
    pub last_updated: String,
    pub edit_url: String,
    pub delete_url: String,
}

impl From<&UserRecord> for UserRow {
    fn from(rec: &UserRecord) -> Self {
        UserRow {
            id: rec.id.to_string(),
            email: rec.email.clone(),
            role: rec.role.as_str().to_string(),
            role_label: rec.role.label().to_string(),
            badge_class: rec.role.badge_class().to_string(),
            created_at: rec.created_at.format("%Y-%m-%d").to_string(),
            last_updated: rec.last_updated.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            edit_url: rec.id.edit_path(),
            delete_url: rec.id.delete_path(),
        }
    }
}
