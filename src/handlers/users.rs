use axum::{
    extract::{Form, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::config::MIN_PASSWORD_LEN;
use crate::error::FlowError;
use crate::flows::{delete_user, edit_role, provision_account, NewAccount, RoleEdit};
use crate::models::{AppState, RecordId, Role, Selection, UserRow};
use crate::templates::{role_options, ConfirmationTemplate, UserEditTemplate, UserNewTemplate, UsersPageTemplate};

use super::helpers::{authenticated_sid, build_template_globals, lookup_record, render_template, TemplateGlobals};

fn to_login() -> Response {
    Redirect::to("/login").into_response()
}

pub async fn users_list(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let Some(sid) = authenticated_sid(&state, &jar) else {
        return to_login();
    };
    state.sessions.clear_selection(&sid);
    if let Err(e) = state.flows.directory.refresh().await {
        state.flash(&sid, FlowError::Load(e).notification());
    }
    let rows: Vec<UserRow> = state.flows.directory.snapshot().iter().map(UserRow::from).collect();
    let TemplateGlobals {
        current_admin,
        backend_label,
        base_url,
        flash_messages,
        has_flash_messages,
    } = build_template_globals(&state, &jar);
    render_template(UsersPageTemplate {
        current_admin,
        backend_label,
        base_url,
        flash_messages,
        has_flash_messages,
        rows: &rows,
    })
}

pub async fn user_new_get(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let Some(sid) = authenticated_sid(&state, &jar) else {
        return to_login();
    };
    state.sessions.select(&sid, Selection::Creating);
    let TemplateGlobals {
        current_admin,
        backend_label,
        base_url,
        flash_messages,
        has_flash_messages,
    } = build_template_globals(&state, &jar);
    render_template(UserNewTemplate {
        current_admin,
        backend_label,
        base_url,
        flash_messages,
        has_flash_messages,
        roles: role_options(),
        default_role: Role::default().as_str().to_string(),
        min_password_len: MIN_PASSWORD_LEN,
    })
}

#[derive(Deserialize)]
pub struct CreateUserForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: String,
}

pub async fn users_create(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CreateUserForm>,
) -> Response {
    let Some(sid) = authenticated_sid(&state, &jar) else {
        return to_login();
    };
    if !state.sessions.selection(&sid).is_creating() {
        state.flash(&sid, "Open the Add User form first");
        return Redirect::to("/users").into_response();
    }
    let account = match NewAccount::parse(&form.email, &form.password, &form.role) {
        Ok(a) => a,
        Err(e) => {
            state.flash(&sid, e.notification());
            return Redirect::to("/users/new").into_response();
        }
    };
    match provision_account(&state.flows, account).await {
        Ok(_) => {
            state.flash(&sid, "User created successfully");
            state.sessions.clear_selection(&sid);
            Redirect::to("/users").into_response()
        }
        Err(e) => {
            state.flash(&sid, e.notification());
            Redirect::to("/users/new").into_response()
        }
    }
}

pub async fn user_edit_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Some(sid) = authenticated_sid(&state, &jar) else {
        return to_login();
    };
    let id = RecordId(id);
    let Some(record) = lookup_record(&state, &id).await else {
        state.flash(&sid, "User not found");
        return Redirect::to("/users").into_response();
    };
    state.sessions.select(&sid, Selection::Editing(id));
    let TemplateGlobals {
        current_admin,
        backend_label,
        base_url,
        flash_messages,
        has_flash_messages,
    } = build_template_globals(&state, &jar);
    render_template(UserEditTemplate {
        current_admin,
        backend_label,
        base_url,
        flash_messages,
        has_flash_messages,
        user: UserRow::from(&record),
        roles: role_options(),
        min_password_len: MIN_PASSWORD_LEN,
    })
}

#[derive(Deserialize)]
pub struct EditUserForm {
    pub role: String,
    #[serde(default)]
    pub new_password: Option<String>,
}

pub async fn user_edit_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(form): Form<EditUserForm>,
) -> Response {
    let Some(sid) = authenticated_sid(&state, &jar) else {
        return to_login();
    };
    let id = RecordId(id);
    if !state.sessions.selection(&sid).is_editing(&id) {
        state.flash(&sid, "Select the user to edit first");
        return Redirect::to("/users").into_response();
    }
    let edit = match RoleEdit::parse(id.clone(), &form.role, form.new_password.as_deref()) {
        Ok(e) => e,
        Err(e) => {
            state.flash(&sid, e.notification());
            return Redirect::to(&id.edit_path()).into_response();
        }
    };
    match edit_role(&state.flows, edit).await {
        Ok(outcome) => {
            state.flash(&sid, "User role updated successfully");
            match &outcome.credential {
                Some(Ok(())) => state.flash(&sid, "Password updated successfully"),
                Some(Err(e)) => state.flash(&sid, format!("Failed to update password: {}", e)),
                None => {}
            }
            state.sessions.clear_selection(&sid);
            Redirect::to("/users").into_response()
        }
        Err(e) => {
            state.flash(&sid, e.notification());
            Redirect::to(&id.edit_path()).into_response()
        }
    }
}

pub async fn user_delete_get(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let Some(sid) = authenticated_sid(&state, &jar) else {
        return to_login();
    };
    let id = RecordId(id);
    let Some(record) = lookup_record(&state, &id).await else {
        state.flash(&sid, "User not found");
        return Redirect::to("/users").into_response();
    };
    state.sessions.select(&sid, Selection::Deleting(id.clone()));
    let warning = if state.deletion_policy.removes_identity() {
        "This action cannot be undone. The user will be removed from both authentication and the database."
    } else {
        "This action cannot be undone. The user's record will be removed; their sign-in account is kept."
    };
    let TemplateGlobals {
        current_admin,
        backend_label,
        base_url,
        flash_messages,
        has_flash_messages,
    } = build_template_globals(&state, &jar);
    render_template(ConfirmationTemplate {
        current_admin,
        backend_label,
        base_url,
        flash_messages,
        has_flash_messages,
        title: "Delete User".into(),
        message: "Are you sure you want to delete this user?".into(),
        warning: warning.into(),
        target_url: id.delete_path(),
        confirm_label: "Delete User".into(),
        button_class: "btn btn-danger".into(),
        user: UserRow::from(&record),
    })
}

pub async fn user_delete_post(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let Some(sid) = authenticated_sid(&state, &jar) else {
        return to_login();
    };
    let id = RecordId(id);
    if !state.sessions.selection(&sid).is_deleting(&id) {
        state.flash(&sid, "Select the user to delete first");
        return Redirect::to("/users").into_response();
    }
    let Some(target) = lookup_record(&state, &id).await else {
        state.flash(&sid, "User not found");
        state.sessions.clear_selection(&sid);
        return Redirect::to("/users").into_response();
    };
    if state.sessions.current_identity(&sid).as_ref() == Some(&target.auth_identity_id) {
        state.flash(&sid, "Cannot delete own account");
        state.sessions.clear_selection(&sid);
        return Redirect::to("/users").into_response();
    }
    match delete_user(&state.flows, &target, state.deletion_policy).await {
        Ok(outcome) => {
            state.flash(&sid, "User deleted successfully");
            if let Some(Err(e)) = &outcome.identity {
                state.flash(&sid, format!("The sign-in account could not be removed: {}", e));
            }
            state.sessions.clear_selection(&sid);
            Redirect::to("/users").into_response()
        }
        Err(e) => {
            state.flash(&sid, e.notification());
            Redirect::to(&id.delete_path()).into_response()
        }
    }
}

pub async fn users_cancel(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(sid) = authenticated_sid(&state, &jar) {
        state.sessions.clear_selection(&sid);
    }
    Redirect::to("/users")
}
