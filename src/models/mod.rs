pub mod app_state;
pub mod current_admin;
pub mod role;
pub mod selection;
pub mod user_record;
pub mod user_row;

pub use app_state::AppState;
pub use current_admin::CurrentAdmin;
pub use role::Role;
pub use selection::Selection;
pub use user_record::{IdentityId, NewUserRecord, RecordId, RecordPatch, StoredUser, UserRecord};
pub use user_row::UserRow;
