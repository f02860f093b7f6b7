use async_trait::async_trait;
use serde_json::Value;

use super::client::{api_call, is_okay, path_segment, response_code, response_detail};
use super::{AuthGateway, ScopedSession, SessionHandle};
use crate::error::AuthError;
use crate::models::IdentityId;

/// Auth service reached over HTTP.
#[derive(Clone)]
pub struct RestAuthGateway {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl RestAuthGateway {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_token: api_token.into(),
        }
    }

    async fn call(&self, method: &str, endpoint: &str, body: Option<Value>) -> Value {
        api_call(&self.client, &self.base_url, &self.api_token, method, endpoint, body).await
    }
}

/// Map an error envelope to an [`AuthError`].
pub fn auth_error_from(payload: &Value) -> AuthError {
    match response_code(payload) {
        "EMAIL_EXISTS" => AuthError::DuplicateEmail,
        "INVALID_EMAIL" => AuthError::InvalidEmail,
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        "INVALID_CREDENTIALS" => AuthError::InvalidCredentials,
        code => AuthError::Provider(format!("{}: {}", code, response_detail(payload))),
    }
}

fn session_from(payload: &Value) -> Result<SessionHandle, AuthError> {
    let data = payload.get("data").cloned().unwrap_or(Value::Null);
    let field = |key: &str| {
        data.get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AuthError::Provider(format!("response is missing `{}`", key)))
    };
    Ok(SessionHandle {
        identity_id: IdentityId(field("identityId")?),
        email: field("email")?,
        token: field("token")?,
    })
}

fn expect_okay(payload: Value) -> Result<(), AuthError> {
    if is_okay(&payload) {
        Ok(())
    } else {
        Err(auth_error_from(&payload))
    }
}

#[async_trait]
impl AuthGateway for RestAuthGateway {
    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, AuthError> {
        let body = serde_json::json!({"email": email, "password": password});
        let payload = self.call("POST", "/v1/sessions", Some(body)).await;
        if !is_okay(&payload) {
            return Err(auth_error_from(&payload));
        }
        session_from(&payload)
    }

    async fn create_identity(
        &self,
        scope: &mut ScopedSession,
        email: &str,
        password: &str,
    ) -> Result<IdentityId, AuthError> {
        let body = serde_json::json!({"email": email, "password": password});
        let payload = self.call("POST", "/v1/identities", Some(body)).await;
        if !is_okay(&payload) {
            return Err(auth_error_from(&payload));
        }
        let handle = session_from(&payload)?;
        let id = handle.identity_id.clone();
        scope.sign_in(handle);
        Ok(id)
    }

    async fn delete_identity(&self, id: &IdentityId) -> Result<(), AuthError> {
        let endpoint = format!("/v1/identities/{}", path_segment(id.as_str()));
        expect_okay(self.call("DELETE", &endpoint, None).await)
    }

    async fn change_credential(&self, id: &IdentityId, new_password: &str) -> Result<(), AuthError> {
        let endpoint = format!("/v1/identities/{}/password", path_segment(id.as_str()));
        let body = serde_json::json!({"password": new_password});
        expect_okay(self.call("PUT", &endpoint, Some(body)).await)
    }

    async fn end_session(&self, session: &SessionHandle) -> Result<(), AuthError> {
        let endpoint = format!("/v1/sessions/{}", path_segment(&session.token));
        expect_okay(self.call("DELETE", &endpoint, None).await)
    }
}
