//! Stripe webhook handling
//!
//! Verifies provider-signed events and reconciles subscription state into
//! the user's metadata on the identity provider. Processing is replay-safe:
//! the metadata merge is a pure function of event content, so redelivering
//! the same event lands on the same end state. Out-of-order delivery of
//! *different* events for one subscription is a known gap: Stripe exposes
//! no sequence number we could order by.

use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use launchkit_identity::{
    find_user_by_email, generate_password, DirectoryUser, NewUser, UserDirectory, UserMetadata,
};

use crate::client::StripeClient;
use crate::error::{BillingError, BillingResult};
use crate::events::{
    CheckoutNotice, CheckoutPayload, SubscriptionNotice, SubscriptionPayload, WebhookEvent,
};

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed payload before it is rejected as a replay
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Webhook handler for Stripe events
pub struct WebhookHandler {
    stripe: StripeClient,
    directory: Arc<dyn UserDirectory>,
}

impl WebhookHandler {
    pub fn new(stripe: StripeClient, directory: Arc<dyn UserDirectory>) -> Self {
        Self { stripe, directory }
    }

    /// Verify a webhook delivery and decode its envelope.
    ///
    /// `payload` must be the exact bytes Stripe sent: the signature covers
    /// the raw body, so any re-serialization upstream breaks verification.
    /// The signature header has the form `t=<timestamp>,v1=<hex>,...`; the
    /// expected signature is HMAC-SHA256 over `"{t}.{payload}"`.
    pub fn verify_event(&self, payload: &str, signature: &str) -> BillingResult<WebhookEvent> {
        let webhook_secret = &self.stripe.config().webhook_secret;

        // Body and secret are never logged, only their lengths
        tracing::debug!(
            payload_len = payload.len(),
            signature_len = signature.len(),
            "Verifying webhook delivery"
        );

        // Parse the signature header: t=timestamp,v1=signature,v0=signature
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<String> = None;

        for part in signature.split(',') {
            let kv: Vec<&str> = part.splitn(2, '=').collect();
            if kv.len() == 2 {
                match kv[0] {
                    "t" => timestamp = kv[1].parse().ok(),
                    "v1" => v1_signature = Some(kv[1].to_string()),
                    _ => {}
                }
            }
        }

        let timestamp = timestamp.ok_or_else(|| {
            tracing::warn!("Missing timestamp in signature header");
            BillingError::WebhookSignatureInvalid
        })?;

        let v1_signature = v1_signature.ok_or_else(|| {
            tracing::warn!("Missing v1 signature in signature header");
            BillingError::WebhookSignatureInvalid
        })?;

        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_err(|e| {
                tracing::error!("System time error: {}", e);
                BillingError::WebhookSignatureInvalid
            })?
            .as_secs() as i64;

        if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            tracing::warn!(
                timestamp = timestamp,
                now = now,
                diff = (now - timestamp).abs(),
                "Webhook timestamp outside tolerance"
            );
            return Err(BillingError::WebhookSignatureInvalid);
        }

        // The secret starts with "whsec_"; the remainder is the HMAC key
        let secret_key = webhook_secret
            .strip_prefix("whsec_")
            .unwrap_or(webhook_secret);
        let signed_payload = format!("{}.{}", timestamp, payload);

        let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes()).map_err(|_| {
            tracing::error!("Invalid webhook secret key");
            BillingError::WebhookSignatureInvalid
        })?;
        mac.update(signed_payload.as_bytes());
        let computed = hex::encode(mac.finalize().into_bytes());

        if computed != v1_signature {
            tracing::warn!(payload_len = payload.len(), "Webhook signature mismatch");
            return Err(BillingError::WebhookSignatureInvalid);
        }

        // Only the envelope is decoded here; the object stays opaque until
        // the type tag is matched, so unknown event types still verify
        let event: WebhookEvent = serde_json::from_str(payload).map_err(|e| {
            tracing::error!(parse_error = %e, "Failed to decode webhook envelope");
            BillingError::WebhookPayloadInvalid(e.to_string())
        })?;

        tracing::info!(
            event_type = %event.event_type,
            event_id = %event.id,
            "Webhook verified"
        );

        Ok(event)
    }

    /// Handle a verified event.
    ///
    /// Each handler performs a single metadata write at most, so a failed
    /// delivery is never partially applied; Stripe redelivers the whole
    /// event on a non-2xx response.
    pub async fn handle_event(&self, event: WebhookEvent) -> BillingResult<()> {
        match event.event_type.as_str() {
            "checkout.session.completed" | "invoice.payment_succeeded" => {
                let payload: CheckoutPayload = serde_json::from_value(event.data.object)
                    .map_err(|e| BillingError::WebhookPayloadInvalid(e.to_string()))?;
                self.apply_checkout(&event.id, CheckoutNotice::from(payload))
                    .await
            }
            "customer.subscription.updated" | "customer.subscription.deleted" => {
                let payload: SubscriptionPayload = serde_json::from_value(event.data.object)
                    .map_err(|e| BillingError::WebhookPayloadInvalid(e.to_string()))?;
                self.apply_subscription_change(&event.id, SubscriptionNotice::from(payload))
                    .await
            }
            _ => {
                // Track which events we're not handling; helps identify new
                // types that may need handlers
                tracing::info!(
                    event_type = %event.event_type,
                    event_id = %event.id,
                    "Received unhandled Stripe event type - no handler configured"
                );
                Ok(())
            }
        }
    }

    /// A checkout settled or an invoice was paid: record the subscription
    /// on the buyer's account, creating the account for guest checkouts.
    pub async fn apply_checkout(
        &self,
        event_id: &str,
        notice: CheckoutNotice,
    ) -> BillingResult<()> {
        // Direct id wins; no email fallback when it does not resolve, since
        // a stamped id pointing nowhere is a real inconsistency worth a retry
        if let Some(user_id) = &notice.user_id {
            let user = self
                .directory
                .get_user_by_id(user_id)
                .await?
                .ok_or_else(|| BillingError::UserNotFound(format!("id {user_id}")))?;
            return self.record_subscription(event_id, user, &notice).await;
        }

        let Some(email) = notice.email.clone() else {
            tracing::warn!(
                event_id = %event_id,
                "Billing event carries neither user id nor email; nothing to reconcile"
            );
            return Ok(());
        };

        match find_user_by_email(self.directory.as_ref(), &email).await? {
            Some(user) => self.record_subscription(event_id, user, &notice).await,
            None => self.provision_guest_account(event_id, &email, &notice).await,
        }
    }

    async fn record_subscription(
        &self,
        event_id: &str,
        user: DirectoryUser,
        notice: &CheckoutNotice,
    ) -> BillingResult<()> {
        // `user` was fetched just above, so this merge sits on top of the
        // freshest metadata the provider will give us
        let mut metadata = user.metadata;
        metadata.set_subscription(notice.subscription_id.clone());
        self.directory
            .update_user_metadata(&user.id, &metadata)
            .await?;

        tracing::info!(
            event_id = %event_id,
            user_id = %user.id,
            subscription_id = ?notice.subscription_id,
            "Recorded subscription on user account"
        );
        Ok(())
    }

    /// Guest checkout: a purchase by an email with no matching account.
    /// The account is created with an unguessable password and a
    /// pre-confirmed email, then the provider's invitation flow lets the
    /// buyer set their own credentials.
    async fn provision_guest_account(
        &self,
        event_id: &str,
        email: &str,
        notice: &CheckoutNotice,
    ) -> BillingResult<()> {
        let mut metadata = UserMetadata::default();
        metadata.set_subscription(notice.subscription_id.clone());
        if let Some(name) = &notice.customer_name {
            metadata
                .extra
                .insert("full_name".to_string(), serde_json::Value::String(name.clone()));
        }

        let created = self
            .directory
            .create_user(NewUser {
                email: email.to_string(),
                password: generate_password(),
                email_confirmed: true,
                metadata,
            })
            .await?;
        self.directory.invite_by_email(email).await?;

        tracing::info!(
            event_id = %event_id,
            user_id = %created.id,
            subscription_id = ?notice.subscription_id,
            "Provisioned account for guest checkout"
        );
        Ok(())
    }

    /// A subscription changed or was deleted: update the cancellation
    /// fields and refresh the subscription id. Both event types funnel
    /// through here; a deletion arrives with `cancel_at_period_end` unset
    /// and therefore clears the cancellation fields.
    pub async fn apply_subscription_change(
        &self,
        event_id: &str,
        notice: SubscriptionNotice,
    ) -> BillingResult<()> {
        let user = self
            .resolve_user(notice.user_id.as_deref(), notice.email.as_deref())
            .await?;

        let mut metadata = user.metadata;
        metadata.apply_cancellation(notice.cancel_at);
        metadata.set_subscription(Some(notice.subscription_id.clone()));
        self.directory
            .update_user_metadata(&user.id, &metadata)
            .await?;

        tracing::info!(
            event_id = %event_id,
            user_id = %user.id,
            subscription_id = %notice.subscription_id,
            cancel_at = ?notice.cancel_at,
            "Applied subscription change"
        );
        Ok(())
    }

    /// Map event identifiers to a user record. Never creates accounts:
    /// there is nothing to reconcile for a user that does not exist, and
    /// guest provisioning is reserved for checkout/invoice events.
    async fn resolve_user(
        &self,
        user_id: Option<&str>,
        email: Option<&str>,
    ) -> BillingResult<DirectoryUser> {
        if let Some(id) = user_id {
            return self
                .directory
                .get_user_by_id(id)
                .await?
                .ok_or_else(|| BillingError::UserNotFound(format!("id {id}")));
        }
        if let Some(email) = email {
            return find_user_by_email(self.directory.as_ref(), email)
                .await?
                .ok_or_else(|| BillingError::UserNotFound(format!("email {email}")));
        }
        Err(BillingError::UserNotFound(
            "event without user id or email".to_string(),
        ))
    }
}
