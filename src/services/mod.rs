pub mod backend;
pub mod local_auth;
pub mod local_records;
pub mod password;
pub mod persistence;

// Re-export commonly used items
pub use backend::{build_backends, ensure_bootstrap_admin, Backends};
pub use local_auth::LocalAuthGateway;
pub use local_records::LocalRecordStore;
pub use password::{generate_password_hash, random_token, verify_password};
