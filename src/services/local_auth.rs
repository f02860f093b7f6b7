use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use super::password::{generate_password_hash, random_token, verify_password};
use super::persistence::{load_json, persist_json};
use crate::api::{AuthGateway, ScopedSession, SessionHandle};
use crate::config::MIN_PASSWORD_LEN;
use crate::error::AuthError;
use crate::models::IdentityId;

const IDENTITIES_FILE: &str = "identities.json";

#[derive(Clone, Debug, Serialize, Deserialize)]
struct LocalIdentity {
    email: String,
    password: String,
}

/// In-process auth service. Identities survive restarts when a data directory
/// is configured; sessions never do.
pub struct LocalAuthGateway {
    identities: Mutex<HashMap<IdentityId, LocalIdentity>>,
    sessions: Mutex<HashMap<String, IdentityId>>,
    path: Option<PathBuf>,
}

/// Loose structural check: one `@`, non-empty local part, dotted domain, no
/// whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

impl LocalAuthGateway {
    pub fn in_memory() -> Self {
        Self {
            identities: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            path: None,
        }
    }

    /// Open the gateway backed by `<data_dir>/identities.json`.
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self, std::io::Error> {
        let path = data_dir.into().join(IDENTITIES_FILE);
        let identities = load_json(&path)?.unwrap_or_default();
        Ok(Self {
            identities: Mutex::new(identities),
            sessions: Mutex::new(HashMap::new()),
            path: Some(path),
        })
    }

    pub fn contains(&self, id: &IdentityId) -> bool {
        self.identities.lock().unwrap().contains_key(id)
    }

    pub fn identity_count(&self) -> usize {
        self.identities.lock().unwrap().len()
    }

    pub fn active_session_count(&self) -> usize {
        self.sessions.lock().unwrap().len()
    }

    fn persist(&self, identities: &HashMap<IdentityId, LocalIdentity>) -> Result<(), AuthError> {
        if let Some(path) = &self.path {
            persist_json(path, identities).map_err(|e| {
                tracing::error!(%e, "Failed to persist identities");
                AuthError::Provider(format!("failed to persist identities: {}", e))
            })?;
        }
        Ok(())
    }

    fn open_session(&self, identity_id: &IdentityId, email: &str) -> SessionHandle {
        let token = random_token();
        self.sessions
            .lock()
            .unwrap()
            .insert(token.clone(), identity_id.clone());
        SessionHandle {
            identity_id: identity_id.clone(),
            email: email.to_string(),
            token,
        }
    }
}

#[async_trait]
impl AuthGateway for LocalAuthGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError> {
        let wanted = email.trim().to_lowercase();
        let found = {
            let identities = self.identities.lock().unwrap();
            identities
                .iter()
                .find(|(_, ident)| ident.email == wanted && verify_password(&ident.password, password))
                .map(|(id, ident)| (id.clone(), ident.email.clone()))
        };
        match found {
            Some((id, email)) => Ok(self.open_session(&id, &email)),
            None => Err(AuthError::InvalidCredentials),
        }
    }

    async fn create_identity(
        &self,
        scope: &mut ScopedSession,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, AuthError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let id = IdentityId(random_token());
        {
            let mut identities = self.identities.lock().unwrap();
            if identities.values().any(|ident| ident.email == email) {
                return Err(AuthError::DuplicateEmail);
            }
            identities.insert(
                id.clone(),
                LocalIdentity {
                    email: email.clone(),
                    password: generate_password_hash(password),
                },
            );
            if let Err(e) = self.persist(&identities) {
                identities.remove(&id);
                return Err(e);
            }
        }
        scope.sign_in(self.open_session(&id, &email));
        Ok(id)
    }

    async fn delete_identity(&self, id: &IdentityId) -> Result<(), AuthError> {
        {
            let mut identities = self.identities.lock().unwrap();
            let Some(removed) = identities.remove(id) else {
                return Err(AuthError::Provider(format!("identity {} not found", id)));
            };
            if let Err(e) = self.persist(&identities) {
                identities.insert(id.clone(), removed);
                return Err(e);
            }
        }
        self.sessions.lock().unwrap().retain(|_, owner| owner != id);
        Ok(())
    }

    async fn change_credential(&self, id: &IdentityId, new_password: &str) -> Result<(), AuthError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }
        let mut identities = self.identities.lock().unwrap();
        let Some(ident) = identities.get_mut(id) else {
            return Err(AuthError::Provider(format!("identity {} not found", id)));
        };
        let previous = std::mem::replace(&mut ident.password, generate_password_hash(new_password));
        if let Err(e) = self.persist(&identities) {
            if let Some(ident) = identities.get_mut(id) {
                ident.password = previous;
            }
            return Err(e);
        }
        Ok(())
    }

    async fn end_session(&self, session: &SessionHandle) -> Result<(), AuthError> {
        self.sessions.lock().unwrap().remove(&session.token);
        Ok(())
    }
}
