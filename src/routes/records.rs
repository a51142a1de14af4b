//! Record access route handlers

use crate::error::{validation_error, ApiResult};
use crate::models::{
    ColumnSet, CreateRecordRequest, Record, RecordCreatedResponse, RecordListResponse,
    RecordQuery, SuccessResponse,
};
use crate::state::SharedState;
use crate::store::RecordStore;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;
use uuid::Uuid;

/// Create a record of `entity_name`
pub async fn create_record(
    State(state): State<SharedState>,
    Path(entity_name): Path<String>,
    Json(payload): Json<CreateRecordRequest>,
) -> ApiResult<Json<SuccessResponse<RecordCreatedResponse>>> {
    let record = Record {
        entity_name: entity_name.clone(),
        id: payload.id,
        attributes: payload.attributes,
    };
    let id = state.store.create(record).await?;

    Ok(Json(SuccessResponse::with_data(
        format!("{} created", entity_name),
        RecordCreatedResponse { entity_name, id },
    )))
}

pub async fn get_record(
    State(state): State<SharedState>,
    Path((entity_name, id)): Path<(String, Uuid)>,
) -> ApiResult<Json<SuccessResponse<Record>>> {
    let record = state
        .store
        .retrieve(&entity_name, id, &ColumnSet::All)
        .await?;
    Ok(Json(SuccessResponse::with_data(
        format!("{}({})", entity_name, id),
        record,
    )))
}

/// List records of `entity_name`, optionally filtered by `?attribute=&value=`
pub async fn list_records(
    State(state): State<SharedState>,
    Path(entity_name): Path<String>,
    Query(query): Query<RecordQuery>,
) -> ApiResult<Json<SuccessResponse<RecordListResponse>>> {
    let records = match query.filter().map_err(validation_error)? {
        Some((attribute, value)) => {
            debug!("Querying {} where {} = {}", entity_name, attribute, value.display_text());
            state
                .store
                .query(&entity_name, &ColumnSet::All, attribute, &value)
                .await?
        }
        None => state.store.list(&entity_name).await,
    };

    let total = records.len();
    Ok(Json(SuccessResponse::with_data(
        format!("Found {} {} record(s)", total, entity_name),
        RecordListResponse { records, total },
    )))
}
