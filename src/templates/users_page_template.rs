use askama::Template;
use crate::models::{CurrentAdmin, UserRow};

#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersPageTemplate<'a> {
    pub current_admin: Option<CurrentAdmin>,
    pub backend_label: String,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub rows: &'a [UserRow],
}

crate::impl_base_template!(UsersPageTemplate<'_>);
