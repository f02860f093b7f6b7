use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::api::{AuthGateway, SessionHandle};
use crate::directory::UserDirectoryStore;
use crate::error::FlowError;
use crate::models::{CurrentAdmin, IdentityId, Role, Selection};
use crate::services::random_token;

/// One signed-in administrator.
#[derive(Clone, Debug)]
pub struct AdminSession {
    pub handle: SessionHandle,
    pub selection: Selection,
}

/// Administrator sessions keyed by the panel's session id.
#[derive(Clone)]
pub struct AdminSessionController {
    auth: Arc<dyn AuthGateway>,
    sessions: Arc<Mutex<HashMap<String, AdminSession>>>,
}

impl AdminSessionController {
    pub fn new(auth: Arc<dyn AuthGateway>) -> Self {
        Self {
            auth,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Sign in through the auth service and open a panel session. Only
    /// identities whose record carries the `admin` role are let in.
    pub async fn login(
        &self,
        directory: &UserDirectoryStore,
        email: &str,
        password: &str,
    ) -> Result<String, FlowError> {
        let handle = self.auth.sign_in(email.trim(), password).await?;

        let allowed = match directory.refresh().await {
            Ok(_) => directory
                .snapshot()
                .iter()
                .any(|u| u.auth_identity_id == handle.identity_id && u.role == Role::Admin),
            Err(e) => {
                if let Err(end) = self.auth.end_session(&handle).await {
                    tracing::warn!(%end, "Failed to end session after directory load failure");
                }
                return Err(FlowError::Load(e));
            }
        };
        if !allowed {
            tracing::warn!(email = %handle.email, "Rejected panel login for non-admin account");
            if let Err(e) = self.auth.end_session(&handle).await {
                tracing::warn!(%e, "Failed to end rejected session");
            }
            return Err(FlowError::NotAdmin);
        }

        let sid = random_token();
        tracing::info!(email = %handle.email, "Administrator signed in");
        self.sessions.lock().unwrap().insert(
            sid.clone(),
            AdminSession {
                handle,
                selection: Selection::None,
            },
        );
        Ok(sid)
    }

    pub fn is_authenticated(&self, sid: &str) -> bool {
        self.sessions.lock().unwrap().contains_key(sid)
    }

    pub fn current(&self, sid: &str) -> Option<CurrentAdmin> {
        self.sessions.lock().unwrap().get(sid).map(|s| CurrentAdmin {
            email: s.handle.email.clone(),
        })
    }

    pub fn current_identity(&self, sid: &str) -> Option<IdentityId> {
        self.sessions
            .lock()
            .unwrap()
            .get(sid)
            .map(|s| s.handle.identity_id.clone())
    }

    /// Check that the session's identity still has an admin record in the
    /// directory. A demoted or deleted administrator loses the session here.
    pub async fn revalidate(&self, sid: &str, directory: &UserDirectoryStore) -> bool {
        let handle = {
            let sessions = self.sessions.lock().unwrap();
            sessions.get(sid).map(|s| s.handle.clone())
        };
        let Some(handle) = handle else {
            return false;
        };
        let still_admin = directory
            .snapshot()
            .iter()
            .any(|u| u.auth_identity_id == handle.identity_id && u.role == Role::Admin);
        if still_admin {
            return true;
        }
        self.sessions.lock().unwrap().remove(sid);
        tracing::warn!(email = %handle.email, "Administrator access revoked; session dropped");
        if let Err(e) = self.auth.end_session(&handle).await {
            tracing::warn!(%e, "Failed to end revoked session");
        }
        false
    }

    /// End the session. If the auth service refuses, the session stays
    /// authenticated.
    pub async fn logout(&self, sid: &str) -> Result<(), FlowError> {
        let handle = {
            let sessions = self.sessions.lock().unwrap();
            sessions.get(sid).map(|s| s.handle.clone())
        };
        let Some(handle) = handle else {
            return Ok(());
        };
        if let Err(e) = self.auth.end_session(&handle).await {
            tracing::error!(%e, "Error logging out");
            return Err(FlowError::Logout(e));
        }
        self.sessions.lock().unwrap().remove(sid);
        tracing::info!(email = %handle.email, "Administrator signed out");
        Ok(())
    }

    pub fn selection(&self, sid: &str) -> Selection {
        self.sessions
            .lock()
            .unwrap()
            .get(sid)
            .map(|s| s.selection.clone())
            .unwrap_or_default()
    }

    /// Focus an interaction, replacing whatever was selected before.
    pub fn select(&self, sid: &str, selection: Selection) -> bool {
        match self.sessions.lock().unwrap().get_mut(sid) {
            Some(s) => {
                s.selection = selection;
                true
            }
            None => false,
        }
    }

    /// Return to idle after a successful submit or a cancel.
    pub fn clear_selection(&self, sid: &str) {
        self.select(sid, Selection::None);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }
}
