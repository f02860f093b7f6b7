//! Capability contracts for the two external services the panel depends on,
//! plus their HTTP implementations.
//!
//! The flows only ever see [`AuthGateway`] and [`UserRecordService`]; which
//! backend sits behind them is decided once at startup (see
//! [`crate::services::backend`]).

pub mod auth;
pub mod client;
pub mod records;

use async_trait::async_trait;

use crate::error::{AuthError, RecordError};
use crate::models::{IdentityId, NewUserRecord, RecordId, RecordPatch, StoredUser};

pub use auth::RestAuthGateway;
pub use client::{api_call, set_silent};
pub use records::RestRecordService;

/// An authenticated session issued by the auth service.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    pub identity_id: IdentityId,
    pub email: String,
    pub token: String,
}

/// Secondary auth context used to create identities without touching the
/// administrator's own session. Creating an identity signs it into the scope,
/// so the scope must be ended once the provisioning attempt is over.
#[derive(Debug, Default)]
pub struct ScopedSession {
    pub(crate) signed_in: Option<SessionHandle>,
}

impl ScopedSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity currently signed into the scope, if any.
    pub fn current(&self) -> Option<&SessionHandle> {
        self.signed_in.as_ref()
    }

    pub fn sign_in(&mut self, handle: SessionHandle) {
        self.signed_in = Some(handle);
    }

    pub fn take(&mut self) -> Option<SessionHandle> {
        self.signed_in.take()
    }
}

#[async_trait]
pub trait AuthGateway: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError>;

    async fn open_scoped_session(&self) -> Result<ScopedSession, AuthError> {
        Ok(ScopedSession::new())
    }

    async fn create_identity(
        &self,
        scope: &mut ScopedSession,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, AuthError>;

    async fn delete_identity(&self, id: &IdentityId) -> Result<(), AuthError>;

    async fn change_credential(&self, id: &IdentityId, new_password: &str) -> Result<(), AuthError>;

    async fn end_session(&self, session: &SessionHandle) -> Result<(), AuthError>;

    /// Sign out whatever identity the scope holds.
    async fn end_scoped_session(&self, mut scope: ScopedSession) -> Result<(), AuthError> {
        match scope.take() {
            Some(handle) => self.end_session(&handle).await,
            None => Ok(()),
        }
    }
}

#[async_trait]
pub trait UserRecordService: Send + Sync {
    async fn list_all(&self) -> Result<Vec<StoredUser>, RecordError>;

    async fn create(&self, record: NewUserRecord) -> Result<RecordId, RecordError>;

    async fn update(&self, id: &RecordId, patch: RecordPatch) -> Result<(), RecordError>;

    async fn delete(&self, id: &RecordId) -> Result<(), RecordError>;
}
