// Base template trait shared by every page
pub mod base_template;
pub use base_template::BaseTemplate;

pub mod login_template;
pub mod users_page_template;
pub mod user_new_template;
pub mod user_edit_template;
pub mod confirmation_template;

pub use login_template::LoginTemplate;
pub use users_page_template::UsersPageTemplate;
pub use user_new_template::UserNewTemplate;
pub use user_edit_template::UserEditTemplate;
pub use confirmation_template::ConfirmationTemplate;

/// `(value, label)` pairs for role selects, in display order.
pub fn role_options() -> Vec<(String, String)> {
    crate::models::Role::all()
        .iter()
        .map(|r| (r.as_str().to_string(), r.label().to_string()))
        .collect()
}
