use chrono::Utc;
use std::sync::{Arc, Mutex};

use crate::api::UserRecordService;
use crate::error::RecordError;
use crate::models::{RecordId, UserRecord};

/// In-memory list of known users, kept in sync with the record service.
#[derive(Clone)]
pub struct UserDirectoryStore {
    records: Arc<dyn UserRecordService>,
    users: Arc<Mutex<Vec<UserRecord>>>,
}

impl UserDirectoryStore {
    pub fn new(records: Arc<dyn UserRecordService>) -> Self {
        Self {
            records,
            users: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Reload every record from the service. On failure the previous list is
    /// left untouched.
    pub async fn refresh(&self) -> Result<usize, RecordError> {
        let stored = match self.records.list_all().await {
            Ok(list) => list,
            Err(e) => {
                tracing::error!(%e, "Error fetching users");
                return Err(e);
            }
        };
        let now = Utc::now();
        let mut fresh: Vec<UserRecord> = stored.into_iter().map(|s| s.normalize(now)).collect();
        fresh.sort_by(|a, b| a.email.cmp(&b.email).then_with(|| a.id.cmp(&b.id)));
        let count = fresh.len();
        *self.users.lock().unwrap() = fresh;
        tracing::debug!(count, "User directory refreshed");
        Ok(count)
    }

    /// Current list, sorted by email.
    pub fn snapshot(&self) -> Vec<UserRecord> {
        self.users.lock().unwrap().clone()
    }

    pub fn find(&self, id: &RecordId) -> Option<UserRecord> {
        self.users.lock().unwrap().iter().find(|u| &u.id == id).cloned()
    }

    pub fn find_by_email(&self, email: &str) -> Option<UserRecord> {
        let wanted = email.trim().to_lowercase();
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email.to_lowercase() == wanted)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewUserRecord, RecordPatch, Role, StoredUser};
    use crate::services::LocalRecordStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlakyList {
        inner: LocalRecordStore,
        fail: AtomicBool,
    }

    #[async_trait]
    impl UserRecordService for FlakyList {
        async fn list_all(&self) -> Result<Vec<StoredUser>, RecordError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(RecordError::Load("unavailable".into()));
            }
            self.inner.list_all().await
        }
        async fn create(&self, record: NewUserRecord) -> Result<RecordId, RecordError> {
            self.inner.create(record).await
        }
        async fn update(&self, id: &RecordId, patch: RecordPatch) -> Result<(), RecordError> {
            self.inner.update(id, patch).await
        }
        async fn delete(&self, id: &RecordId) -> Result<(), RecordError> {
            self.inner.delete(id).await
        }
    }

    fn new_record(email: &str) -> NewUserRecord {
        NewUserRecord {
            auth_identity_id: email.into(),
            email: email.into(),
            role: Role::User,
        }
    }

    #[tokio::test]
    async fn refresh_sorts_by_email() {
        let store = LocalRecordStore::in_memory();
        store.create(new_record("zed@x.com")).await.unwrap();
        store.create(new_record("amy@x.com")).await.unwrap();
        let dir = UserDirectoryStore::new(Arc::new(store));
        assert_eq!(dir.refresh().await.unwrap(), 2);
        let emails: Vec<String> = dir.snapshot().into_iter().map(|u| u.email).collect();
        assert_eq!(emails, vec!["amy@x.com", "zed@x.com"]);
        assert!(dir.find_by_email("AMY@x.com").is_some());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_list() {
        let flaky = Arc::new(FlakyList {
            inner: LocalRecordStore::in_memory(),
            fail: AtomicBool::new(false),
        });
        flaky.create(new_record("a@x.com")).await.unwrap();
        let dir = UserDirectoryStore::new(flaky.clone());
        dir.refresh().await.unwrap();

        flaky.fail.store(true, Ordering::SeqCst);
        assert!(matches!(dir.refresh().await, Err(RecordError::Load(_))));
        assert_eq!(dir.len(), 1);
    }

    #[tokio::test]
    async fn failed_first_load_leaves_empty_list() {
        let flaky = Arc::new(FlakyList {
            inner: LocalRecordStore::in_memory(),
            fail: AtomicBool::new(true),
        });
        let dir = UserDirectoryStore::new(flaky);
        assert!(dir.refresh().await.is_err());
        assert!(dir.is_empty());
    }
}
