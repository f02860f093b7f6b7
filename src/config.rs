use std::env;
use std::path::{Path, PathBuf};

// Default configuration constants
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_PUBLIC_BASE_URL: &str = "";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_BOOTSTRAP_ADMIN_EMAIL: &str = "admin@localhost.local";
pub const DEFAULT_BOOTSTRAP_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;
pub const MIN_PASSWORD_LEN: usize = 6;

/// Which implementation sits behind the auth and record traits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process services, optionally persisted to `DATA_DIR`.
    Local,
    /// Remote services over HTTP.
    Rest,
}

/// What a confirmed deletion removes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletionPolicy {
    RecordOnly,
    RecordAndIdentity,
}

impl DeletionPolicy {
    pub fn removes_identity(&self) -> bool {
        matches!(self, DeletionPolicy::RecordAndIdentity)
    }
}

/// Settings resolved from the environment at startup.
#[derive(Clone, Debug)]
pub struct Settings {
    pub backend: BackendKind,
    pub data_dir: PathBuf,
    pub auth_api_base_url: String,
    pub records_api_base_url: String,
    pub api_token: String,
    pub public_base_url: String,
    pub deletion_policy: DeletionPolicy,
    pub bootstrap_admin_email: String,
    pub bootstrap_admin_password: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Settings {
            backend: get_backend_kind(),
            data_dir: get_data_dir(),
            auth_api_base_url: get_auth_api_base_url(),
            records_api_base_url: get_records_api_base_url(),
            api_token: get_api_token(),
            public_base_url: get_public_base_url(),
            deletion_policy: get_deletion_policy(),
            bootstrap_admin_email: env::var("BOOTSTRAP_ADMIN_EMAIL")
                .unwrap_or_else(|_| DEFAULT_BOOTSTRAP_ADMIN_EMAIL.to_string()),
            bootstrap_admin_password: env::var("BOOTSTRAP_ADMIN_PASSWORD")
                .unwrap_or_else(|_| DEFAULT_BOOTSTRAP_ADMIN_PASSWORD.to_string()),
        }
    }

    /// Problems that prevent the configured backend from working.
    pub fn problems(&self) -> Vec<String> {
        let mut out = vec![];
        if self.backend == BackendKind::Rest {
            if self.auth_api_base_url.is_empty() {
                out.push("AUTH_API_BASE_URL is not configured".to_string());
            }
            if self.records_api_base_url.is_empty() {
                out.push("RECORDS_API_BASE_URL is not configured".to_string());
            }
            if self.api_token.trim().is_empty() {
                out.push("API_TOKEN is not configured".to_string());
            }
        }
        if self.bootstrap_admin_password.chars().count() < MIN_PASSWORD_LEN {
            out.push(format!(
                "BOOTSTRAP_ADMIN_PASSWORD must be at least {} characters",
                MIN_PASSWORD_LEN
            ));
        }
        out
    }
}

pub fn load_env_file(env_file: Option<&str>) {
    if let Some(path) = env_file {
        dotenvy::from_path(Path::new(path)).ok();
    } else {
        dotenvy::dotenv().ok();
    }
}

pub fn get_backend_kind() -> BackendKind {
    match env::var("BACKEND").unwrap_or_default().trim().to_lowercase().as_str() {
        "rest" | "http" => BackendKind::Rest,
        _ => BackendKind::Local,
    }
}

pub fn get_data_dir() -> PathBuf {
    PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string()))
}

pub fn get_auth_api_base_url() -> String {
    trim_base_url(&env::var("AUTH_API_BASE_URL").unwrap_or_default())
}

pub fn get_records_api_base_url() -> String {
    trim_base_url(&env::var("RECORDS_API_BASE_URL").unwrap_or_default())
}

pub fn get_api_token() -> String {
    env::var("API_TOKEN").unwrap_or_default()
}

pub fn get_public_base_url() -> String {
    sanitize_base_url(&env::var("PUBLIC_BASE_URL").unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.to_string()))
}

pub fn get_deletion_policy() -> DeletionPolicy {
    match env::var("DELETION_POLICY").unwrap_or_default().trim().to_lowercase().as_str() {
        "record_only" | "record-only" => DeletionPolicy::RecordOnly,
        _ => DeletionPolicy::RecordAndIdentity,
    }
}

fn trim_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

pub fn sanitize_base_url(raw: &str) -> String {
    let trimmed = trim_base_url(raw);
    if trimmed.is_empty() {
        format!("http://{}:{}", DEFAULT_HOST, DEFAULT_PORT)
    } else {
        trimmed
    }
}
