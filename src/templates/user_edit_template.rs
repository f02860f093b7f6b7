use askama::Template;
use crate::models::{CurrentAdmin, UserRow};

#[derive(Template)]
#[template(path = "user_edit.html")]
pub struct UserEditTemplate {
    pub current_admin: Option<CurrentAdmin>,
    pub backend_label: String,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub user: UserRow,
    pub roles: Vec<(String, String)>,
    pub min_password_len: usize,
}

crate::impl_base_template!(UserEditTemplate);
