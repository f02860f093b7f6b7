use axum::{
    extract::{Form, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::models::AppState;
use crate::templates::LoginTemplate;

use super::helpers::{authenticated_sid, build_template_globals, render_template, session_id_from_jar, TemplateGlobals, SESSION_COOKIE};

#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// `?notice=` values set by redirects to the login page.
#[derive(Deserialize, Default)]
pub struct LoginQuery {
    #[serde(default)]
    pub notice: Option<String>,
}

fn notice_message(notice: Option<&str>) -> Option<String> {
    match notice? {
        "logged_out" => Some("Logged out successfully".to_string()),
        "revoked" => Some("Your administrator access has been revoked".to_string()),
        _ => None,
    }
}

fn login_page(
    state: &AppState,
    jar: &CookieJar,
    email: String,
    error: Option<String>,
    notice: Option<String>,
) -> Response {
    let TemplateGlobals {
        current_admin,
        backend_label,
        base_url,
        flash_messages,
        has_flash_messages,
    } = build_template_globals(state, jar);
    render_template(LoginTemplate {
        current_admin,
        backend_label,
        base_url,
        flash_messages,
        has_flash_messages,
        email,
        error,
        notice,
    })
}

pub async fn login_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    if authenticated_sid(&state, &jar).is_some() {
        return Redirect::to("/users").into_response();
    }
    let notice = notice_message(query.notice.as_deref());
    login_page(&state, &jar, String::new(), None, notice)
}

pub async fn login_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> impl IntoResponse {
    match state
        .sessions
        .login(&state.flows.directory, &form.email, &form.password)
        .await
    {
        Ok(sid) => {
            let mut cookie = Cookie::new(SESSION_COOKIE, sid);
            cookie.set_path("/");
            cookie.set_http_only(true);
            cookie.set_same_site(SameSite::Lax);
            cookie.set_max_age(time::Duration::hours(12));
            (jar.add(cookie), Redirect::to("/users")).into_response()
        }
        Err(e) => {
            tracing::warn!(%e, "Panel login failed");
            login_page(&state, &jar, form.email.trim().to_string(), Some(e.notification()), None)
        }
    }
}

pub async fn logout_post(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let Some(sid) = session_id_from_jar(&jar) else {
        return Redirect::to("/login").into_response();
    };
    match state.sessions.logout(&sid).await {
        Ok(()) => {
            state.flash_store.lock().unwrap().remove(&sid);
            let mut removal = Cookie::new(SESSION_COOKIE, "");
            removal.set_path("/");
            (jar.remove(removal), Redirect::to("/login?notice=logged_out")).into_response()
        }
        Err(e) => {
            state.flash(&sid, e.notification());
            Redirect::to("/users").into_response()
        }
    }
}

pub async fn root_get(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if authenticated_sid(&state, &jar).is_some() {
        return Redirect::to("/users").into_response();
    }
    Redirect::to("/login").into_response()
}
