//! Public subscription plan catalog

use axum::extract::State;
use axum::Json;

use launchkit_billing::PlanProduct;

use crate::error::ApiResult;
use crate::state::AppState;

/// `GET /api/plans`
pub async fn list_plans(State(state): State<AppState>) -> ApiResult<Json<Vec<PlanProduct>>> {
    let plans = state.catalog.list_plans().await?;
    Ok(Json(plans))
}
