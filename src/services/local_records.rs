use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

use super::password::random_token;
use super::persistence::{load_json, persist_json};
use crate::api::UserRecordService;
use crate::error::RecordError;
use crate::models::{NewUserRecord, RecordId, RecordPatch, StoredUser};

const USERS_FILE: &str = "users.json";

/// In-process user-record service. Acts as the "server" for timestamps:
/// `created_at` is stamped on create and `last_updated` on every write.
pub struct LocalRecordStore {
    records: Mutex<BTreeMap<RecordId, StoredUser>>,
    path: Option<PathBuf>,
}

/// Server timestamp for a write, strictly after `previous`.
fn server_timestamp(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now();
    match previous {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

impl LocalRecordStore {
    pub fn in_memory() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            path: None,
        }
    }

    /// Open the store backed by `<data_dir>/users.json`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let path = data_dir.into().join(USERS_FILE);
        let list: Vec<StoredUser> = load_json(&path)?.unwrap_or_default();
        let records = list.into_iter().map(|r| (r.id.clone(), r)).collect();
        Ok(Self {
            records: Mutex::new(records),
            path: Some(path),
        })
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn persist(&self, records: &BTreeMap<RecordId, StoredUser>) -> Result<(), RecordError> {
        if let Some(path) = &self.path {
            let list: Vec<&StoredUser> = records.values().collect();
            persist_json(path, &list).map_err(|e| {
                tracing::error!(%e, "Failed to persist user records");
                RecordError::Write(format!("failed to persist user records: {}", e))
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl UserRecordService for LocalRecordStore {
    async fn list_all(&self) -> Result<Vec<StoredUser>, RecordError> {
        Ok(self.records.lock().unwrap().values().cloned().collect())
    }

    async fn create(&self, record: NewUserRecord) -> Result<RecordId, RecordError> {
        let mut records = self.records.lock().unwrap();
        if records.values().any(|r| r.auth_identity_id == record.auth_identity_id) {
            return Err(RecordError::Write(format!(
                "identity {} already has a record",
                record.auth_identity_id
            )));
        }
        let id = RecordId(random_token());
        let now = server_timestamp(None);
        records.insert(
            id.clone(),
            StoredUser {
                id: id.clone(),
                auth_identity_id: record.auth_identity_id,
                email: record.email,
                role: record.role,
                created_at: Some(now),
                last_updated: Some(now),
            },
        );
        if let Err(e) = self.persist(&records) {
            records.remove(&id);
            return Err(e);
        }
        Ok(id)
    }

    async fn update(&self, id: &RecordId, patch: RecordPatch) -> Result<(), RecordError> {
        let mut records = self.records.lock().unwrap();
        let Some(existing) = records.get(id).cloned() else {
            return Err(RecordError::Write(format!("record {} not found", id)));
        };
        let mut updated = existing.clone();
        if let Some(role) = patch.role {
            updated.role = role;
        }
        updated.last_updated = Some(server_timestamp(existing.last_updated));
        records.insert(id.clone(), updated);
        if let Err(e) = self.persist(&records) {
            records.insert(id.clone(), existing);
            return Err(e);
        }
        Ok(())
    }

    async fn delete(&self, id: &RecordId) -> Result<(), RecordError> {
        let mut records = self.records.lock().unwrap();
        let Some(removed) = records.remove(id) else {
            return Err(RecordError::Write(format!("record {} not found", id)));
        };
        if let Err(e) = self.persist(&records) {
            records.insert(id.clone(), removed);
            return Err(e);
        }
        Ok(())
    }
}
