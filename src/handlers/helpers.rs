use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;

use crate::models::{AppState, CurrentAdmin, RecordId, UserRecord};
use crate::templates::BaseTemplate;

pub const SESSION_COOKIE: &str = "session_id";

pub fn session_id_from_jar(jar: &CookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Session id of an authenticated administrator, if the cookie carries one.
pub fn authenticated_sid(state: &AppState, jar: &CookieJar) -> Option<String> {
    let sid = session_id_from_jar(jar)?;
    state.sessions.is_authenticated(&sid).then_some(sid)
}

pub fn build_current_admin(state: &AppState, jar: &CookieJar) -> Option<CurrentAdmin> {
    let sid = session_id_from_jar(jar)?;
    state.sessions.current(&sid)
}

pub fn take_flash_messages(state: &AppState, jar: &CookieJar) -> Vec<String> {
    let Some(sid) = session_id_from_jar(jar) else {
        return vec![];
    };
    let mut fs = state.flash_store.lock().unwrap();
    fs.remove(&sid).unwrap_or_default()
}

#[derive(Default)]
pub struct TemplateGlobals {
    pub current_admin: Option<CurrentAdmin>,
    pub backend_label: String,
    pub base_url: String,
    pub flash_messages: Vec<String>,
    pub has_flash_messages: bool,
}

pub fn build_template_globals(state: &AppState, jar: &CookieJar) -> TemplateGlobals {
    let current_admin = build_current_admin(state, jar);
    let flash_messages = take_flash_messages(state, jar);
    let has_flash_messages = !flash_messages.is_empty();
    TemplateGlobals {
        current_admin,
        backend_label: state.backend_label.clone(),
        base_url: state.public_base_url.clone(),
        flash_messages,
        has_flash_messages,
    }
}

/// Append a `window.__APP_CONTEXT__` object before `</body>`.
pub fn inject_context<T: BaseTemplate>(page: &T, mut html: String) -> Response {
    let context = serde_json::json!({
        "backend": page.backend_label(),
        "baseUrl": page.base_url(),
        "currentAdmin": page.current_admin(),
    });
    let context_str = serde_json::to_string(&context).unwrap_or_else(|_| "{}".into());
    let inject = format!(
        r#"<script>window.__APP_CONTEXT__ = {};</script></body>"#,
        context_str
    );
    html = html.replace("</body>", &inject);
    Html(html).into_response()
}

pub fn render_template<T: askama::Template + BaseTemplate>(t: T) -> Response {
    match t.render() {
        Ok(body) => inject_context(&t, body),
        Err(e) => {
            tracing::error!(%e, "Template render error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}

/// Resolve a record from the directory, reloading once if it is not known
/// yet (for example after another administrator created it).
pub async fn lookup_record(state: &AppState, id: &RecordId) -> Option<UserRecord> {
    if let Some(rec) = state.flows.directory.find(id) {
        return Some(rec);
    }
    if let Err(e) = state.flows.directory.refresh().await {
        tracing::warn!(%e, "Directory refresh failed during lookup");
    }
    state.flows.directory.find(id)
}
