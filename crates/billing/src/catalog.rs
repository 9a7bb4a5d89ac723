//! Subscription plan catalog
//!
//! Backs the public pricing page: active products with their active
//! recurring prices, cheapest first. One-off prices and products without a
//! recurring price are filtered out.

use serde::Serialize;
use stripe::{Expandable, ListPrices, Price, PriceType};

use crate::client::StripeClient;
use crate::error::BillingResult;

/// A sellable product with its recurring prices, sorted ascending by amount
#[derive(Debug, Clone, Serialize)]
pub struct PlanProduct {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub prices: Vec<PlanPrice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlanPrice {
    pub id: String,
    pub currency: String,
    /// Amount in the currency's minor unit (cents)
    pub unit_amount: i64,
    /// Billing interval, e.g. "month" or "year"
    pub interval: Option<String>,
}

/// Read-only catalog queries against Stripe
#[derive(Clone)]
pub struct CatalogService {
    stripe: StripeClient,
}

impl CatalogService {
    pub fn new(stripe: StripeClient) -> Self {
        Self { stripe }
    }

    /// List active products with their active recurring prices.
    ///
    /// A single price listing with the product expanded covers the whole
    /// catalog in one call; plans are small enough that pagination beyond
    /// the first page has never been needed.
    pub async fn list_plans(&self) -> BillingResult<Vec<PlanProduct>> {
        let mut params = ListPrices::new();
        params.active = Some(true);
        params.type_ = Some(PriceType::Recurring);
        params.limit = Some(100);
        params.expand = &["data.product"];

        let prices = Price::list(self.stripe.inner(), &params).await?;

        let mut plans: Vec<PlanProduct> = Vec::new();
        for price in prices.data {
            let product = match &price.product {
                Some(Expandable::Object(product)) => product,
                _ => continue,
            };
            if !product.active.unwrap_or(false) {
                continue;
            }

            let product_id = product.id.to_string();
            let plan = match plans.iter_mut().find(|p| p.id == product_id) {
                Some(plan) => plan,
                None => {
                    plans.push(PlanProduct {
                        id: product_id,
                        name: product.name.clone().unwrap_or_default(),
                        description: product.description.clone(),
                        prices: Vec::new(),
                    });
                    #[allow(clippy::unwrap_used)] // just pushed
                    plans.last_mut().unwrap()
                }
            };

            plan.prices.push(PlanPrice {
                id: price.id.to_string(),
                currency: price
                    .currency
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "usd".to_string()),
                unit_amount: price.unit_amount.unwrap_or(0),
                interval: price
                    .recurring
                    .as_ref()
                    .map(|r| r.interval.to_string()),
            });
        }

        sort_and_prune(&mut plans);

        tracing::debug!(plan_count = plans.len(), "Fetched plan catalog");
        Ok(plans)
    }
}

/// Cheapest price first within a plan, cheapest plan first overall,
/// price-less plans dropped
fn sort_and_prune(plans: &mut Vec<PlanProduct>) {
    for plan in plans.iter_mut() {
        plan.prices.sort_by_key(|p| p.unit_amount);
    }
    plans.retain(|p| !p.prices.is_empty());
    plans.sort_by_key(|p| p.prices.first().map(|pr| pr.unit_amount).unwrap_or(i64::MAX));
}
