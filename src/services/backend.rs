use std::sync::Arc;

use super::{LocalAuthGateway, LocalRecordStore};
use crate::api::{AuthGateway, RestAuthGateway, RestRecordService, UserRecordService};
use crate::config::{BackendKind, Settings};
use crate::error::FlowError;
use crate::flows::{provision_account, FlowContext, NewAccount};
use crate::models::Role;

/// The pair of service handles the flows run against.
#[derive(Clone)]
pub struct Backends {
    pub auth: Arc<dyn AuthGateway>,
    pub records: Arc<dyn UserRecordService>,
}

pub fn build_backends(settings: &Settings, client: reqwest::Client) -> Result<Backends, std::io::Error> {
    match settings.backend {
        BackendKind::Local => {
            let auth = LocalAuthGateway::open(&settings.data_dir)?;
            let records = LocalRecordStore::open(&settings.data_dir)?;
            tracing::info!(data_dir = %settings.data_dir.display(), "Using local backend");
            Ok(Backends {
                auth: Arc::new(auth),
                records: Arc::new(records),
            })
        }
        BackendKind::Rest => {
            tracing::info!(
                auth = %settings.auth_api_base_url,
                records = %settings.records_api_base_url,
                "Using REST backend"
            );
            Ok(Backends {
                auth: Arc::new(RestAuthGateway::new(
                    client.clone(),
                    &settings.auth_api_base_url,
                    &settings.api_token,
                )),
                records: Arc::new(RestRecordService::new(
                    client,
                    &settings.records_api_base_url,
                    &settings.api_token,
                )),
            })
        }
    }
}

/// Provision the bootstrap administrator when no admin record exists yet.
/// Returns whether an account was created.
pub async fn ensure_bootstrap_admin(ctx: &FlowContext, email: &str, password: &str) -> Result<bool, FlowError> {
    ctx.directory.refresh().await.map_err(FlowError::Load)?;
    if ctx.directory.snapshot().iter().any(|u| u.role == Role::Admin) {
        return Ok(false);
    }
    let account = NewAccount::parse(email, password, Role::Admin.as_str())?;
    provision_account(ctx, account).await?;
    tracing::warn!(email, "Created bootstrap administrator; change its password");
    Ok(true)
}
