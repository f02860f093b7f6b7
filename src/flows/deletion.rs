use crate::config::DeletionPolicy;
use crate::error::{AuthError, FlowError};
use crate::models::UserRecord;

use super::FlowContext;

/// Result of a deletion whose record removal succeeded.
#[derive(Debug)]
pub struct DeletionOutcome {
    /// Outcome of the identity removal; `None` when the policy keeps
    /// identities.
    pub identity: Option<Result<(), AuthError>>,
}

impl DeletionOutcome {
    pub fn identity_failed(&self) -> bool {
        matches!(self.identity, Some(Err(_)))
    }
}

/// Delete the user's metadata record and, per `policy`, their identity.
///
/// The identity step runs only after the record is gone and its failure
/// neither blocks nor undoes the record deletion. Nothing is retried.
pub async fn delete_user(
    ctx: &FlowContext,
    target: &UserRecord,
    policy: DeletionPolicy,
) -> Result<DeletionOutcome, FlowError> {
    if let Err(e) = ctx.records.delete(&target.id).await {
        tracing::error!(%e, record = %target.id, "Error deleting user");
        return Err(FlowError::Deletion(e));
    }
    tracing::info!(record = %target.id, email = %target.email, "User record deleted");

    let identity = if policy.removes_identity() {
        let result = ctx.auth.delete_identity(&target.auth_identity_id).await;
        if let Err(e) = &result {
            tracing::error!(%e, identity = %target.auth_identity_id, "Error deleting auth identity");
        }
        Some(result)
    } else {
        None
    };

    ctx.refresh_after("delete_user").await;
    Ok(DeletionOutcome { identity })
}
