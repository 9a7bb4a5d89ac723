//! Billing error types

use launchkit_identity::IdentityError;
use thiserror::Error;

pub type BillingResult<T> = Result<T, BillingError>;

/// Errors from webhook processing and Stripe API calls.
///
/// The HTTP layer maps these onto statuses: signature and payload problems
/// become 400 so Stripe's retry policy treats the delivery as rejected;
/// everything downstream becomes 500 so Stripe redelivers the event later.
#[derive(Debug, Error)]
pub enum BillingError {
    /// Signature header missing, malformed, expired, or mismatched
    #[error("webhook signature verification failed")]
    WebhookSignatureInvalid,

    /// The body verified but could not be decoded into an event
    #[error("webhook payload invalid: {0}")]
    WebhookPayloadInvalid(String),

    /// The event could not be mapped to a user record
    #[error("no user record found for {0}")]
    UserNotFound(String),

    /// The identity provider call failed; Stripe should redeliver
    #[error(transparent)]
    Directory(#[from] IdentityError),

    /// Stripe API call failed
    #[error("stripe api error: {0}")]
    StripeApi(#[from] stripe::StripeError),

    /// Configuration problem (missing env var etc.)
    #[error("billing configuration error: {0}")]
    Configuration(String),
}
