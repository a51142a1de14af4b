//! Entity metadata route handlers

use crate::error::{validation_error, ApiResult};
use crate::models::{EntityMetadata, RegisterEntityRequest, SuccessResponse};
use crate::state::SharedState;
use crate::store::MetadataProvider;
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;
use validator::Validate;

/// Register or replace the metadata of one entity type
pub async fn register_entity(
    State(state): State<SharedState>,
    Json(payload): Json<RegisterEntityRequest>,
) -> ApiResult<Json<SuccessResponse<EntityMetadata>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let metadata = payload.into_metadata();
    state.store.register_entity(metadata.clone()).await;

    info!("Registered entity '{}'", metadata.logical_name);
    Ok(Json(SuccessResponse::with_data(
        format!("Entity '{}' registered", metadata.logical_name),
        metadata,
    )))
}

pub async fn describe_entity(
    State(state): State<SharedState>,
    Path(entity_name): Path<String>,
) -> ApiResult<Json<SuccessResponse<EntityMetadata>>> {
    let metadata = state.store.describe_entity(&entity_name).await?;
    Ok(Json(SuccessResponse::with_data(
        format!("Metadata of '{}'", entity_name),
        metadata,
    )))
}
