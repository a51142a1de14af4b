//! Error handling module
//!
//! Provides the store, engine and HTTP error types used across the crate.

use crate::models::Reference;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Failures reported by a record store or metadata provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity_name} with id {id} does not exist")]
    NotFound { entity_name: String, id: Uuid },

    #[error("entity type '{0}' is not known to the store")]
    UnknownEntity(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Errors raised by settings discovery, cloning and trigger handling
#[derive(Error, Debug)]
pub enum CloneError {
    #[error("entity type '{entity_name}' could not be described")]
    SchemaNotFound {
        entity_name: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to persist {what}")]
    PersistenceFailure {
        what: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to load {entity_name} {id}")]
    RetrieveFailed {
        entity_name: String,
        id: Uuid,
        #[source]
        source: StoreError,
    },

    #[error("failed to query {entity_name} records by '{attribute}'")]
    QueryFailed {
        entity_name: String,
        attribute: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to create {entity_name} record")]
    CreateFailed {
        entity_name: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to associate {related} with {entity_name} {id} via '{relationship}'")]
    AssociateFailed {
        relationship: String,
        entity_name: String,
        id: Uuid,
        related: Reference,
        #[source]
        source: StoreError,
    },

    #[error("specification {specification_id} targets '{expected}', not '{actual}'")]
    EntityMismatch {
        specification_id: Uuid,
        expected: String,
        actual: String,
    },

    #[error("invalid trigger payload: {0}")]
    InvalidTriggerPayload(String),
}

impl CloneError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            CloneError::SchemaNotFound { .. } => "SCHEMA_NOT_FOUND",
            CloneError::PersistenceFailure { .. } => "PERSISTENCE_FAILURE",
            CloneError::RetrieveFailed { .. } => "RETRIEVE_FAILED",
            CloneError::QueryFailed { .. } => "QUERY_FAILED",
            CloneError::CreateFailed { .. } => "CREATE_FAILED",
            CloneError::AssociateFailed { .. } => "ASSOCIATE_FAILED",
            CloneError::EntityMismatch { .. } => "ENTITY_MISMATCH",
            CloneError::InvalidTriggerPayload(_) => "INVALID_TRIGGER_PAYLOAD",
        }
    }

    /// Message including the underlying store error, when there is one
    pub fn detailed_message(&self) -> String {
        match std::error::Error::source(self) {
            Some(cause) => format!("{}: {}", self, cause),
            None => self.to_string(),
        }
    }
}

/// Application-wide error type for the HTTP layer
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Engine error: {0}")]
    Engine(#[from] CloneError),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

fn store_status(e: &StoreError) -> (StatusCode, &'static str) {
    match e {
        StoreError::NotFound { .. } | StoreError::UnknownEntity(_) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        }
        StoreError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
        StoreError::Rejected(_) => (StatusCode::UNPROCESSABLE_ENTITY, "REJECTED"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match &self {
            AppError::Store(e) => {
                let (status, code) = store_status(e);
                (status, code, e.to_string(), None)
            }
            AppError::Engine(e) => {
                let status = match e {
                    CloneError::InvalidTriggerPayload(_) | CloneError::EntityMismatch { .. } => {
                        StatusCode::BAD_REQUEST
                    }
                    CloneError::SchemaNotFound { .. } => StatusCode::NOT_FOUND,
                    CloneError::RetrieveFailed { source, .. } => store_status(source).0,
                    _ => {
                        error!("Clone error: {}", e.detailed_message());
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                };
                (
                    status,
                    e.code(),
                    e.to_string(),
                    std::error::Error::source(e).map(|s| s.to_string()),
                )
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                msg.clone(),
                None,
            ),
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            error: details,
            code: Some(error_code.to_string()),
        });

        (status, body).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, AppError>;

/// Helper function to create a validation error
pub fn validation_error(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}
