use askama::Template;
use crate::models::CurrentAdmin;

#[derive(Template)]
#[template(path = "user_new.html")]
pub struct UserNewTemplate {
    pub current_admin: Option<CurrentAdmin>,
    pub backend_label: String,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    /// `(value, label)` pairs for the role select.
    pub roles: Vec<(String, String)>,
    pub default_role: String,
    pub min_password_len: usize,
}

crate::impl_base_template!(UserNewTemplate);
