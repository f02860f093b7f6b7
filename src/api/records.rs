use async_trait::async_trait;
use serde_json::Value;

use super::client::{api_call, is_okay, path_segment, response_code, response_detail};
use super::UserRecordService;
use crate::error::RecordError;
use crate::models::{NewUserRecord, RecordId, RecordPatch, StoredUser};

/// User-record service reached over HTTP.
#[derive(Clone)]
pub struct RestRecordService {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl RestRecordService {
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

fn failure(payload: &Value) -> String {
    format!("{}: {}", response_code(payload), response_detail(payload))
}

fn write_result(payload: Value) -> Result<(), RecordError> {
    if is_okay(&payload) {
        Ok(())
    } else {
        Err(RecordError::Write(failure(&payload)))
    }
}

#[async_trait]
impl UserRecordService for RestRecordService {
    async fn list_all(&self) -> Result<Vec<StoredUser>, RecordError> {
        let payload = self.call("GET", "/v1/users", None).await;
        if !is_okay(&payload) {
            tracing::error!(code = response_code(&payload), "User list request failed");
            return Err(RecordError::Load(failure(&payload)));
        }
        let data = payload.get("data").cloned().unwrap_or(Value::Array(vec![]));
        serde_json::from_value(data).map_err(|e| RecordError::Load(format!("malformed user list: {}", e)))
    }

    async fn create(&self, record: NewUserRecord) -> Result<RecordId, RecordError> {
        let body = serde_json::to_value(&record).map_err(|e| RecordError::Write(e.to_string()))?;
        let payload = self.call("POST", "/v1/users", Some(body)).await;
        if !is_okay(&payload) {
            return Err(RecordError::Write(failure(&payload)));
        }
        payload
            .get("data")
            .and_then(|d| d.get("id"))
            .and_then(|v| v.as_str())
            .map(RecordId::from)
            .ok_or_else(|| RecordError::Write("response is missing `id`".into()))
    }

    async fn update(&self, id: &RecordId, patch: RecordPatch) -> Result<(), RecordError> {
        let endpoint = format!("/v1/users/{}", path_segment(id.as_str()));
        let body = serde_json::to_value(&patch).map_err(|e| RecordError::Write(e.to_string()))?;
        write_result(self.call("PATCH", &endpoint, Some(body)).await)
    }

    async fn delete(&self, id: &RecordId) -> Result<(), RecordError> {
        let endpoint = format!("/v1/users/{}", path_segment(id.as_str()));
        write_result(self.call("DELETE", &endpoint, None).await)
    }
}
