//! Data models and DTOs (Data Transfer Objects)
//!
//! Records, entity metadata and clone specifications shared by the
//! discovery and clone pipelines, plus the request/response structures
//! used by the API.

pub mod clone_setting;
pub mod metadata;
pub mod record;
pub mod specification;

// Re-export commonly used types
pub use clone_setting::*;
pub use metadata::*;
pub use record::*;
pub use specification::*;

use serde::Serialize;

/// Generic success response
#[derive(Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub data: Option<T>,
}

impl<T: Serialize> SuccessResponse<T> {
    pub fn with_data(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}
