use askama::Template;
use crate::models::CurrentAdmin;

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub current_admin: Option<CurrentAdmin>,
    pub backend_label: String,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
    pub email: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

crate::impl_base_template!(LoginTemplate);
