use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::config::DeletionPolicy;
use crate::flows::FlowContext;
use crate::session::AdminSessionController;

#[derive(Clone)]
pub struct AppState {
    pub flows: FlowContext,
    pub sessions: AdminSessionController,
    pub flash_store: Arc<Mutex<HashMap<String, Vec<String>>>>,
    pub public_base_url: String,
    pub deletion_policy: DeletionPolicy,
    /// Shown in the page footer (`local` or the record service host).
    pub backend_label: String,
    pub custom_css: Option<String>,
}

impl AppState {
    pub fn new(flows: FlowContext, public_base_url: String, deletion_policy: DeletionPolicy) -> Self {
        let sessions = AdminSessionController::new(flows.auth.clone());
        Self {
            flows,
            sessions,
            flash_store: Arc::new(Mutex::new(HashMap::new())),
            public_base_url,
            deletion_policy,
            backend_label: "local".to_string(),
            custom_css: None,
        }
    }

    pub fn with_backend_label(mut self, label: impl Into<String>) -> Self {
        self.backend_label = label.into();
        self
    }

    /// Queue a notification for the next page rendered in this session.
    pub fn flash(&self, sid: &str, message: impl Into<String>) {
        self.flash_store
            .lock()
            .unwrap()
            .entry(sid.to_string())
            .or_default()
            .push(message.into());
    }
}
