//! Account deletion endpoints
//!
//! Deletion is deferred while a subscription is active: the account is only
//! flagged, and the subscription-deleted webhook later clears the flag
//! together with the cancellation fields. Accounts without a subscription
//! are deleted immediately.

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde_json::{json, Value};

use launchkit_identity::DirectoryUser;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `POST /api/account`: request account deletion
pub async fn delete_account(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let user = authenticated_user(&state, &headers).await?;

    if user.metadata.subscription.is_some() {
        let mut metadata = user.metadata;
        metadata.scheduled_account_deletion = Some(true);
        state
            .directory
            .update_user_metadata(&user.id, &metadata)
            .await?;

        tracing::info!(user_id = %user.id, "Account deletion scheduled");
        return Ok(Json(json!({ "status": "scheduled" })));
    }

    state.directory.delete_user(&user.id).await?;
    tracing::info!(user_id = %user.id, "Account deleted");
    Ok(Json(json!({ "status": "deleted" })))
}

/// `POST /api/account/delete/cancel-delete`: withdraw a scheduled deletion
pub async fn cancel_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Value>> {
    let user = authenticated_user(&state, &headers).await?;

    let mut metadata = user.metadata;
    metadata.scheduled_account_deletion = None;
    state
        .directory
        .update_user_metadata(&user.id, &metadata)
        .await?;

    tracing::info!(user_id = %user.id, "Account deletion cancelled");
    Ok(Json(json!({ "status": "cancelled" })))
}

/// Resolve the caller from their bearer token via the identity provider
async fn authenticated_user(state: &AppState, headers: &HeaderMap) -> ApiResult<DirectoryUser> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    state
        .directory
        .get_user_by_token(token)
        .await?
        .ok_or(ApiError::Unauthorized)
}
