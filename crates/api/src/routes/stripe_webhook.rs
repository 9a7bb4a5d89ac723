//! Stripe webhook ingestion endpoint

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /api/stripe/webhook`
///
/// The extractor order matters: the signature covers the exact bytes Stripe
/// sent, so the body is taken as `Bytes` and never passes through a JSON
/// extractor before verification.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("Missing stripe-signature header".to_string()))?;

    let payload = std::str::from_utf8(&body)
        .map_err(|_| ApiError::BadRequest("Webhook body is not valid UTF-8".to_string()))?;

    let event = state.webhooks.verify_event(payload, signature)?;
    state.webhooks.handle_event(event).await?;

    Ok(Json(json!({ "received": true })))
}
