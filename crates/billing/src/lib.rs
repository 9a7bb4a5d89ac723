// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! LaunchKit Billing Module
//!
//! Handles the Stripe integration: webhook verification, reconciliation of
//! subscription state into user metadata, and the public plan catalog.
//!
//! ## Features
//!
//! - **Webhooks**: verify signed events and apply idempotent metadata
//!   updates through the identity directory
//! - **Guest checkout**: provision an account for purchases made by an
//!   email with no matching user
//! - **Catalog**: list active products with their recurring prices for the
//!   pricing page

pub mod catalog;
pub mod client;
pub mod error;
pub mod events;
pub mod webhooks;


// Catalog
pub use catalog::{CatalogService, PlanPrice, PlanProduct};

// Client
pub use client::{StripeClient, StripeConfig};

// Error
pub use error::{BillingError, BillingResult};

// Events
pub use events::{CheckoutNotice, SubscriptionNotice, WebhookEvent};

// Webhooks
pub use webhooks::WebhookHandler;
