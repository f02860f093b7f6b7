use axum::{
    extract::{State, Request},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::models::AppState;
use crate::handlers::helpers::authenticated_sid;

/// Redirect to `/login` unless the request carries a live admin session
/// whose identity still holds the admin role.
pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let Some(sid) = authenticated_sid(&state, &jar) else {
        return Redirect::to("/login").into_response();
    };
    if !state.sessions.revalidate(&sid, &state.flows.directory).await {
        state.flash_store.lock().unwrap().remove(&sid);
        return Redirect::to("/login?notice=revoked").into_response();
    }
    next.run(request).await
}
