// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! LaunchKit API Server
//!
//! HTTP surface for the subscription reconciler: Stripe webhook ingestion,
//! account deletion, and the public plan catalog.

pub mod config;
pub mod error;
pub mod routes;
pub mod security;
pub mod state;

pub use config::Config;
pub use error::{ApiError, ApiResult};
pub use state::AppState;
