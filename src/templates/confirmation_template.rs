use askama::Template;
use crate::models::{CurrentAdmin, UserRow};

#[derive(Template)]
#[template(path = "confirm.html")]
pub struct ConfirmationTemplate {
    pub current_admin: Option<CurrentAdmin>,
    pub backend_label: String,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,

    pub title: String,
    pub message: String,
    pub warning: String,
    pub target_url: String,
    pub confirm_label: String,
    pub button_class: String,
    pub user: UserRow,
}

crate::impl_base_template!(ConfirmationTemplate);
