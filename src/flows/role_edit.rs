use crate::error::{AuthError, FlowError};
use crate::models::{RecordId, RecordPatch, Role};

use super::{check_password, parse_role, FlowContext};

/// Validated role-edit request.
#[derive(Clone, Debug)]
pub struct RoleEdit {
    pub id: RecordId,
    pub new_role: Role,
    pub new_password: Option<String>,
}

impl RoleEdit {
    /// Validate raw form input. A blank password means "keep the current one".
    pub fn parse(id: RecordId, role: &str, new_password: Option<&str>) -> Result<Self, FlowError> {
        let new_role = parse_role(role)?;
        let new_password = match new_password {
            Some(p) if !p.is_empty() => {
                check_password(p)?;
                Some(p.to_string())
            }
            _ => None,
        };
        Ok(RoleEdit {
            id,
            new_role,
            new_password,
        })
    }
}

/// Result of a role edit whose metadata update succeeded.
#[derive(Debug)]
pub struct RoleEditOutcome {
    /// Outcome of the password rotation, if one was requested. Reported on
    /// its own because it never affects the role update.
    pub credential: Option<Result<(), AuthError>>,
}

impl RoleEditOutcome {
    pub fn credential_failed(&self) -> bool {
        matches!(self.credential, Some(Err(_)))
    }
}

/// Update a user's role (and `last_updated`), then optionally rotate their
/// password.
pub async fn edit_role(ctx: &FlowContext, edit: RoleEdit) -> Result<RoleEditOutcome, FlowError> {
    // The identity is needed for the password step; resolve it before writing
    // anything so an unknown record changes nothing.
    let identity_id = if edit.new_password.is_some() {
        let found = match ctx.directory.find(&edit.id) {
            Some(rec) => Some(rec),
            None => {
                ctx.directory.refresh().await.map_err(FlowError::Load)?;
                ctx.directory.find(&edit.id)
            }
        };
        match found {
            Some(rec) => Some(rec.auth_identity_id),
            None => return Err(FlowError::NotFound(edit.id.to_string())),
        }
    } else {
        None
    };

    let patch = RecordPatch {
        role: Some(edit.new_role),
    };
    if let Err(e) = ctx.records.update(&edit.id, patch).await {
        tracing::error!(%e, record = %edit.id, "Error updating user");
        return Err(FlowError::Update(e));
    }
    tracing::info!(record = %edit.id, role = %edit.new_role, "User role updated");

    let credential = match (identity_id, edit.new_password.as_deref()) {
        (Some(identity), Some(password)) => {
            let result = ctx.auth.change_credential(&identity, password).await;
            match &result {
                Ok(()) => tracing::info!(record = %edit.id, "User password changed"),
                Err(e) => tracing::error!(%e, record = %edit.id, "Error changing user password"),
            }
            Some(result)
        }
        _ => None,
    };

    ctx.refresh_after("edit_role").await;
    Ok(RoleEditOutcome { credential })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_password_means_no_rotation() {
        let edit = RoleEdit::parse("r1".into(), "moderator", Some("")).unwrap();
        assert!(edit.new_password.is_none());
        assert_eq!(edit.new_role, Role::Moderator);
    }

    #[test]
    fn short_password_is_rejected() {
        assert!(matches!(
            RoleEdit::parse("r1".into(), "user", Some("abc")),
            Err(FlowError::WeakPassword { .. })
        ));
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(matches!(
            RoleEdit::parse("r1".into(), "owner", None),
            Err(FlowError::InvalidRole(_))
        ));
    }
}
