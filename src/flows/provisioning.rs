use crate::api::ScopedSession;
use crate::error::{AuthError, FlowError, ProvisioningStep, RecordError};
use crate::models::{IdentityId, NewUserRecord, RecordId, Role};

use super::{check_password, parse_role, FlowContext};

/// Validated input for account creation.
#[derive(Clone, Debug)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewAccount {
    /// Validate raw form input. An empty role falls back to `user`; the email
    /// is trimmed and lowercased once so the identity and its record agree.
    pub fn parse(email: &str, password: &str, role: &str) -> Result<Self, FlowError> {
        let role = if role.trim().is_empty() {
            Role::default()
        } else {
            parse_role(role)?
        };
        check_password(password)?;
        Ok(NewAccount {
            email: email.trim().to_lowercase(),
            password: password.to_string(),
            role,
        })
    }
}

/// A successfully provisioned account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Provisioned {
    pub record_id: RecordId,
    pub identity_id: IdentityId,
}

/// Where the provisioning saga stopped.
#[derive(Debug)]
pub enum SagaFailure {
    /// The identity was never created; nothing to undo.
    IdentityCreation(AuthError),
    /// The record write failed after the identity existed. `rollback` holds
    /// the outcome of the compensating identity deletion.
    RecordWrite {
        error: RecordError,
        identity_id: IdentityId,
        rollback: Result<(), AuthError>,
    },
}

impl SagaFailure {
    pub fn step(&self) -> ProvisioningStep {
        match self {
            SagaFailure::IdentityCreation(_) => ProvisioningStep::CreateIdentity,
            SagaFailure::RecordWrite { .. } => ProvisioningStep::WriteRecord,
        }
    }
}

impl From<SagaFailure> for FlowError {
    fn from(failure: SagaFailure) -> Self {
        match failure {
            SagaFailure::IdentityCreation(e) => FlowError::Auth(e),
            SagaFailure::RecordWrite { error, .. } => FlowError::Provisioning {
                step: ProvisioningStep::WriteRecord,
                source: error,
            },
        }
    }
}

/// Create the identity, then its record, undoing the identity if the record
/// cannot be written.
pub async fn run_saga(
    ctx: &FlowContext,
    scope: &mut ScopedSession,
    account: &NewAccount,
) -> Result<Provisioned, SagaFailure> {
    let identity_id = ctx
        .auth
        .create_identity(scope, &account.email, &account.password)
        .await
        .map_err(SagaFailure::IdentityCreation)?;

    let record = NewUserRecord {
        auth_identity_id: identity_id.clone(),
        email: account.email.clone(),
        role: account.role,
    };
    match ctx.records.create(record).await {
        Ok(record_id) => Ok(Provisioned {
            record_id,
            identity_id,
        }),
        Err(error) => {
            tracing::error!(%error, identity = %identity_id, "Record write failed; removing identity");
            let rollback = ctx.auth.delete_identity(&identity_id).await;
            if let Err(cleanup) = &rollback {
                tracing::error!(%cleanup, identity = %identity_id, "Error cleaning up auth identity");
            }
            Err(SagaFailure::RecordWrite {
                error,
                identity_id,
                rollback,
            })
        }
    }
}

/// Create an account: identity plus metadata record as one logical operation.
///
/// The scoped session is signed out on every exit path, and the directory is
/// refreshed on success.
pub async fn provision_account(ctx: &FlowContext, account: NewAccount) -> Result<Provisioned, FlowError> {
    let mut scope = ctx.auth.open_scoped_session().await?;
    let outcome = run_saga(ctx, &mut scope, &account).await;

    if let Err(e) = ctx.auth.end_scoped_session(scope).await {
        tracing::warn!(%e, "Failed to sign out provisioning session");
    }

    match outcome {
        Ok(provisioned) => {
            tracing::info!(email = %account.email, role = %account.role, "User created");
            ctx.refresh_after("provision").await;
            Ok(provisioned)
        }
        Err(failure) => {
            tracing::error!(step = ?failure.step(), email = %account.email, "Error creating user");
            Err(failure.into())
        }
    }
}
