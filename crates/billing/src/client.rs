//! Stripe client wrapper

use std::sync::Arc;

use crate::error::{BillingError, BillingResult};

/// Stripe credentials and webhook settings
#[derive(Clone)]
pub struct StripeConfig {
    pub secret_key: String,
    /// Webhook signing secret (`whsec_...`). Never logged.
    pub webhook_secret: String,
}

impl StripeConfig {
    pub fn from_env() -> BillingResult<Self> {
        let secret_key = std::env::var("STRIPE_SECRET_KEY")
            .map_err(|_| BillingError::Configuration("STRIPE_SECRET_KEY not set".to_string()))?;
        let webhook_secret = std::env::var("STRIPE_WEBHOOK_SECRET").map_err(|_| {
            BillingError::Configuration("STRIPE_WEBHOOK_SECRET not set".to_string())
        })?;
        Ok(Self {
            secret_key,
            webhook_secret,
        })
    }
}

/// Shared Stripe API client
#[derive(Clone)]
pub struct StripeClient {
    inner: stripe::Client,
    config: Arc<StripeConfig>,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        let inner = stripe::Client::new(config.secret_key.clone());
        Self {
            inner,
            config: Arc::new(config),
        }
    }

    pub fn from_env() -> BillingResult<Self> {
        Ok(Self::new(StripeConfig::from_env()?))
    }

    pub fn inner(&self) -> &stripe::Client {
        &self.inner
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }
}
