//! Administrative panel for a user directory kept in an external auth
//! service and an external user-record service.
//!
//! The panel lists users, provisions accounts, edits roles (optionally
//! rotating the password) and deletes accounts. The same flows back the
//! web UI and the `rolepanel users` CLI.

pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod flows;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod templates;
pub mod utils;

pub use directory::UserDirectoryStore;
pub use error::{AuthError, FlowError, RecordError};
pub use routes::build_app;
pub use session::AdminSessionController;
