//! Webhook event envelope and payload decoding
//!
//! Events are decoded in two stages: first the envelope (id, type tag,
//! opaque object), then (only for recognized type tags) the object into a
//! typed payload. Stripe's event taxonomy grows over time; an unknown type
//! must decode cleanly at the envelope stage so ingestion can acknowledge
//! it as a no-op instead of failing the delivery.

use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

/// Outer event envelope, shared by every event type
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    /// Invoice, subscription, checkout session, or anything newer; stays
    /// opaque until the type tag is matched
    pub object: Value,
}

/// Either a bare id string or an expanded object carrying one
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ExpandableId {
    Id(String),
    Object { id: String },
}

impl ExpandableId {
    fn into_id(self) -> String {
        match self {
            ExpandableId::Id(id) => id,
            ExpandableId::Object { id } => id,
        }
    }
}

/// The metadata bag our checkout flow stamps onto sessions and invoices
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct BillingMetadata {
    /// Identity-provider user id, set at checkout time for logged-in buyers
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default, rename = "customerEmail")]
    pub customer_email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ContactDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Fields we read off a checkout session or paid invoice
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct CheckoutPayload {
    #[serde(default)]
    pub metadata: Option<BillingMetadata>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub subscription: Option<ExpandableId>,
    #[serde(default)]
    pub customer_details: Option<ContactDetails>,
    #[serde(default)]
    pub billing_details: Option<ContactDetails>,
}

/// Fields we read off a subscription object
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubscriptionPayload {
    pub id: String,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    /// Epoch seconds of the scheduled cancellation
    #[serde(default)]
    pub cancel_at: Option<i64>,
    #[serde(default)]
    pub metadata: Option<BillingMetadata>,
}

/// What a settled checkout or paid invoice tells us about the buyer
#[derive(Debug, Clone, Default)]
pub struct CheckoutNotice {
    pub user_id: Option<String>,
    pub email: Option<String>,
    pub subscription_id: Option<String>,
    pub customer_name: Option<String>,
}

impl From<CheckoutPayload> for CheckoutNotice {
    fn from(payload: CheckoutPayload) -> Self {
        let metadata = payload.metadata.unwrap_or_default();
        let email = metadata
            .customer_email
            .or(payload.customer_email)
            .or_else(|| payload.customer_details.as_ref().and_then(|d| d.email.clone()));
        let customer_name = payload
            .customer_details
            .as_ref()
            .and_then(|d| d.name.clone())
            .or_else(|| payload.billing_details.as_ref().and_then(|d| d.name.clone()));

        CheckoutNotice {
            user_id: metadata.sub,
            email,
            subscription_id: payload.subscription.map(ExpandableId::into_id),
            customer_name,
        }
    }
}

/// What a subscription lifecycle event tells us
#[derive(Debug, Clone)]
pub struct SubscriptionNotice {
    pub subscription_id: String,
    pub user_id: Option<String>,
    pub email: Option<String>,
    /// `Some` only when the subscription is flagged for end-of-period
    /// cancellation and carries a usable timestamp
    pub cancel_at: Option<OffsetDateTime>,
}

impl From<SubscriptionPayload> for SubscriptionNotice {
    fn from(payload: SubscriptionPayload) -> Self {
        let cancel_at = if payload.cancel_at_period_end {
            payload
                .cancel_at
                .and_then(|secs| OffsetDateTime::from_unix_timestamp(secs).ok())
        } else {
            None
        };
        let metadata = payload.metadata.unwrap_or_default();

        SubscriptionNotice {
            subscription_id: payload.id,
            user_id: metadata.sub,
            email: metadata.customer_email,
            cancel_at,
        }
    }
}
