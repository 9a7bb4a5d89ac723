//! Application state

use std::sync::Arc;

use launchkit_billing::{CatalogService, StripeClient, WebhookHandler};
use launchkit_identity::{SupabaseAdminClient, UserDirectory};

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub directory: Arc<dyn UserDirectory>,
    pub webhooks: Arc<WebhookHandler>,
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    pub fn new(
        config: Config,
        directory: Arc<dyn UserDirectory>,
        stripe: StripeClient,
    ) -> Self {
        let webhooks = Arc::new(WebhookHandler::new(stripe.clone(), directory.clone()));
        let catalog = Arc::new(CatalogService::new(stripe));
        Self {
            config,
            directory,
            webhooks,
            catalog,
        }
    }

    pub fn from_env(config: Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::new();
        let directory: Arc<dyn UserDirectory> = Arc::new(SupabaseAdminClient::from_env(http)?);
        let stripe = StripeClient::from_env()?;
        Ok(Self::new(config, directory, stripe))
    }
}
