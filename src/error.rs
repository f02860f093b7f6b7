//! Error types shared by the gateways, the directory and the flows.
use thiserror::Error;

/// Failures reported by an [`AuthGateway`](crate::api::AuthGateway).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("email address is already registered")]
    DuplicateEmail,

    #[error("email address is invalid")]
    InvalidEmail,

    #[error("password is too weak")]
    WeakPassword,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("auth provider error: {0}")]
    Provider(String),
}

/// Failures reported by a [`UserRecordService`](crate::api::UserRecordService).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("failed to load user records: {0}")]
    Load(String),

    #[error("failed to write user record: {0}")]
    Write(String),
}

/// Step of account provisioning that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningStep {
    CreateIdentity,
    WriteRecord,
}

/// Errors surfaced at the flow boundary. None of them is fatal; each maps to
/// a notification for the administrator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("provisioning failed at {step:?}: {source}")]
    Provisioning {
        step: ProvisioningStep,
        source: RecordError,
    },

    #[error("update failed: {0}")]
    Update(RecordError),

    #[error("deletion failed: {0}")]
    Deletion(RecordError),

    #[error("logout failed: {0}")]
    Logout(AuthError),

    #[error(transparent)]
    Load(RecordError),

    #[error("user record not found: {0}")]
    NotFound(String),

    #[error("account is not allowed to use the admin panel")]
    NotAdmin,
}

impl FlowError {
    /// Human-readable message shown to the administrator.
    pub fn notification(&self) -> String {
        match self {
            FlowError::InvalidRole(role) => format!("Invalid role: {}", role),
            FlowError::WeakPassword { .. } | FlowError::Auth(AuthError::WeakPassword) => {
                "Password should be at least 6 characters".into()
            }
            FlowError::Auth(AuthError::DuplicateEmail) => "This email is already registered".into(),
            FlowError::Auth(AuthError::InvalidEmail) => "Invalid email address".into(),
            FlowError::Auth(AuthError::InvalidCredentials) => "Invalid credentials".into(),
            FlowError::Auth(AuthError::Provider(_)) | FlowError::Provisioning { .. } => {
                "Failed to create user".into()
            }
            FlowError::Update(_) => "Failed to update user role".into(),
            FlowError::Deletion(_) => "Failed to delete user".into(),
            FlowError::Logout(_) => "Failed to log out".into(),
            FlowError::Load(_) => "Failed to load users".into(),
            FlowError::NotFound(_) => "User not found".into(),
            FlowError::NotAdmin => "This account is not an administrator".into(),
        }
    }
}
