use serde_json::Value;
use yansi::Paint;
use std::sync::atomic::{AtomicBool, Ordering};

static SILENT: AtomicBool = AtomicBool::new(false);

pub fn set_silent(silent: bool) {
    SILENT.store(silent, Ordering::Relaxed);
}

fn log_output(msg: String) {
    if !SILENT.load(Ordering::Relaxed) {
        println!("{}", msg);
    }
}

/// Envelope code returned by both services on success.
pub const OKAY: &str = "OKAY";

fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    format!("{}****", visible)
}

/// Core HTTP client function for the auth and record services.
///
/// Every response is folded into the `{code, detail, data}` envelope: transport
/// failures become `{"code": "TRANSPORT_ERROR"}` and unparsable bodies become
/// `{"code": "INVALID_RESPONSE"}`, so callers only ever inspect `code`.
pub async fn api_call(
    client: &reqwest::Client,
    api_base_url: &str,
    api_token: &str,
    method: &str,
    endpoint: &str,
    body: Option<Value>,
) -> Value {
    let url = format!("{}{}", api_base_url, endpoint);

    let mut parts = Vec::new();
    parts.push(Paint::new("curl").fg(yansi::Color::Green).bold().to_string());
    parts.push(format!("-X {}", Paint::new(method).fg(yansi::Color::Yellow).bold()));
    parts.push(format!("'{}'", Paint::new(&url).fg(yansi::Color::Cyan)));
    if !api_token.is_empty() {
        parts.push(format!(
            "{} {}",
            Paint::new("-H").fg(yansi::Color::Magenta),
            Paint::new(format!("'API-Token: {}'", mask_token(api_token))).fg(yansi::Color::Magenta)
        ));
    }
    if body.is_some() {
        // Request bodies carry passwords; only the shape is echoed.
        parts.push(format!("{} '<json>'", Paint::new("-d").fg(yansi::Color::Blue)));
    }
    log_output(format!("Request:\n{}", parts.join(" ")));

    let mut req = match method {
        "POST" => client.post(&url),
        "PUT" => client.put(&url),
        "PATCH" => client.patch(&url),
        "DELETE" => client.delete(&url),
        _ => client.get(&url),
    };
    if !api_token.is_empty() {
        req = req.header("API-Token", api_token);
    }
    if let Some(ref b) = body {
        req = req.json(b);
    }

    let result = match req.send().await {
        Ok(resp) => resp.json().await.unwrap_or_else(|e| {
            serde_json::json!({"code": "INVALID_RESPONSE", "detail": format!("Failed to parse response: {}", e)})
        }),
        Err(e) => serde_json::json!({"code": "TRANSPORT_ERROR", "detail": format!("Request failed: {}", e)}),
    };

    let code = response_code(&result);
    tracing::debug!(method, endpoint, code, "API Response");
    let response_str = Paint::new(format!("code={}", code)).rgb(100, 100, 100).to_string();
    log_output(format!("Response:\n{}", response_str));

    result
}

/// The envelope `code`, or an empty string if missing.
pub fn response_code(payload: &Value) -> &str {
    payload.get("code").and_then(|c| c.as_str()).unwrap_or("")
}

pub fn response_detail(payload: &Value) -> String {
    payload
        .get("detail")
        .and_then(|d| d.as_str())
        .unwrap_or("Unknown error")
        .to_string()
}

pub fn is_okay(payload: &Value) -> bool {
    response_code(payload) == OKAY
}

/// Percent-encode an identifier for use as a single path segment.
pub fn path_segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}
