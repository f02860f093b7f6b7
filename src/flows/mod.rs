//! Admin operations that span the auth gateway and the record service.
//!
//! Each flow is one sequential chain of awaited calls and ends with a
//! directory refresh. Input is validated before any remote call is made.

pub mod deletion;
pub mod provisioning;
pub mod role_edit;

use std::sync::Arc;

use crate::api::{AuthGateway, UserRecordService};
use crate::config::MIN_PASSWORD_LEN;
use crate::directory::UserDirectoryStore;
use crate::error::FlowError;
use crate::models::Role;

pub use deletion::{delete_user, DeletionOutcome};
pub use provisioning::{provision_account, NewAccount, Provisioned, SagaFailure};
pub use role_edit::{edit_role, RoleEdit, RoleEditOutcome};

/// Service handles shared by every flow.
#[derive(Clone)]
pub struct FlowContext {
    pub auth: Arc<dyn AuthGateway>,
    pub records: Arc<dyn UserRecordService>,
    pub directory: UserDirectoryStore,
}

impl FlowContext {
    pub fn new(auth: Arc<dyn AuthGateway>, records: Arc<dyn UserRecordService>) -> Self {
        let directory = UserDirectoryStore::new(records.clone());
        Self {
            auth,
            records,
            directory,
        }
    }

    /// Refresh after a successful mutation. A failed reload does not undo the
    /// mutation, so it is only logged here.
    pub(crate) async fn refresh_after(&self, operation: &str) {
        if let Err(e) = self.directory.refresh().await {
            tracing::warn!(%e, operation, "Directory refresh failed after successful operation");
        }
    }
}

pub fn parse_role(raw: &str) -> Result<Role, FlowError> {
    Role::parse(raw).ok_or_else(|| FlowError::InvalidRole(raw.trim().to_string()))
}

pub fn check_password(password: &str) -> Result<(), FlowError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(FlowError::WeakPassword { min: MIN_PASSWORD_LEN });
    }
    Ok(())
}
