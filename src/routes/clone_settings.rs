//! Clone setting route handlers

use crate::engine::{CloneOutcome, DiscoverySummary};
use crate::error::{validation_error, ApiResult};
use crate::models::{
    CloneRecordRequest, CloneSettingDetails, CreateCloneSettingRequest, RelationshipRule,
    SetRelationshipModeRequest, SuccessResponse,
};
use crate::state::SharedState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// Create a clone setting and discover its rules
pub async fn create_clone_setting(
    State(state): State<SharedState>,
    Json(payload): Json<CreateCloneSettingRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<DiscoverySummary>>)> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let name = payload
        .name
        .unwrap_or_else(|| format!("{} clone setting", payload.entity_name));
    let prefix = payload.prefix.unwrap_or_else(|| state.defaults.prefix.clone());
    let suffix = payload.suffix.unwrap_or_else(|| state.defaults.suffix.clone());

    let specification = state
        .specs
        .create_specification(&name, &payload.entity_name, &prefix, &suffix)
        .await?;
    let summary = state
        .discovery
        .discover_and_persist(&payload.entity_name, specification.id)
        .await?;

    info!(
        "Clone setting '{}' ({}) ready with {} attribute(s)",
        name, specification.id, summary.attributes_created
    );
    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::with_data(
            format!("Clone setting '{}' created", name),
            summary,
        )),
    ))
}

/// A clone setting with its attribute and relationship rules
pub async fn get_clone_setting(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<CloneSettingDetails>>> {
    let specification = state.specs.load_specification(id).await?;
    let attributes = state.specs.load_attribute_rules(id).await?;
    let relationships = state.specs.load_relationship_rules(id).await?;

    Ok(Json(SuccessResponse::with_data(
        format!("Clone setting '{}'", specification.name),
        CloneSettingDetails {
            specification,
            attributes,
            relationships,
        },
    )))
}

pub async fn set_relationship_mode(
    State(state): State<SharedState>,
    Path((id, rule_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetRelationshipModeRequest>,
) -> ApiResult<Json<SuccessResponse<RelationshipRule>>> {
    let rule = state
        .specs
        .set_relationship_mode(id, rule_id, payload.mode)
        .await?;

    debug!("Clone setting {}: '{}' is now {:?}", id, rule.name, rule.mode);
    Ok(Json(SuccessResponse::with_data(
        format!("Relationship '{}' updated", rule.name),
        rule,
    )))
}

/// Clone one record with a clone setting
pub async fn clone_record(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CloneRecordRequest>,
) -> ApiResult<Json<SuccessResponse<CloneOutcome>>> {
    payload.validate().map_err(|e| validation_error(e.to_string()))?;

    let outcome = state
        .engine
        .clone_record(id, &payload.entity_name, payload.entity_id)
        .await?;

    let message = if outcome.related.has_failures() {
        format!(
            "Record cloned with {} related failure(s)",
            outcome.related.failed.len()
        )
    } else {
        "Record cloned".to_string()
    };
    Ok(Json(SuccessResponse::with_data(message, outcome)))
}
