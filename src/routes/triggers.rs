//! Raw trigger route handler

use crate::error::{validation_error, ApiResult};
use crate::models::{SuccessResponse, TriggerRequest};
use crate::state::SharedState;
use crate::trigger::TriggerOutcome;
use axum::{extract::State, Json};
use validator::Validate;

/// Validate loosely-typed trigger parameters and run the matching pipeline
pub async fn handle_trigger(
    State(state): State<SharedState>,
    Json(payload): Json<TriggerRequest>,
) -> ApiResult<Json<SuccessResponse<TriggerOutcome>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let outcome = state
        .dispatcher
        .handle(&payload.message, &payload.parameters)
        .await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Trigger '{}' handled", payload.message),
        outcome,
    )))
}
