//! Clone setting API models and DTOs

use super::{
    AttributeMetadata, AttributeRule, AttributeValue, CloneSpecification, EntityMetadata,
    ManyToManyRelationshipMetadata, OneToManyRelationshipMetadata, PropagationMode, Record,
    RelationshipRule,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

/// Request to create a clone setting and discover its rules
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCloneSettingRequest {
    #[validate(length(min = 1, max = 128, message = "Entity name is required"))]
    pub entity_name: String,
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 100, message = "Prefix must be at most 100 characters"))]
    pub prefix: Option<String>,
    #[validate(length(max = 100, message = "Suffix must be at most 100 characters"))]
    pub suffix: Option<String>,
}

/// Request to clone one record with a clone setting
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CloneRecordRequest {
    #[validate(length(min = 1, max = 128, message = "Entity name is required"))]
    pub entity_name: String,
    pub entity_id: Uuid,
}

/// Operator choice of propagation mode for one relationship
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRelationshipModeRequest {
    pub mode: PropagationMode,
}

/// Raw trigger event as a platform would raise it
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TriggerRequest {
    #[validate(length(min = 1, message = "Message name is required"))]
    pub message: String,
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

/// Request to register entity metadata
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterEntityRequest {
    #[validate(length(min = 1, max = 128, message = "Entity name is required"))]
    pub logical_name: String,
    #[serde(default)]
    pub primary_id_attribute: String,
    #[serde(default)]
    pub primary_name_attribute: String,
    #[serde(default)]
    pub attributes: Vec<AttributeMetadata>,
    #[serde(default)]
    pub one_to_many_relationships: Vec<OneToManyRelationshipMetadata>,
    #[serde(default)]
    pub many_to_many_relationships: Vec<ManyToManyRelationshipMetadata>,
}

impl RegisterEntityRequest {
    pub fn into_metadata(self) -> EntityMetadata {
        EntityMetadata {
            logical_name: self.logical_name,
            primary_id_attribute: self.primary_id_attribute,
            primary_name_attribute: self.primary_name_attribute,
            attributes: self.attributes,
            one_to_many_relationships: self.one_to_many_relationships,
            many_to_many_relationships: self.many_to_many_relationships,
        }
    }
}

/// Request body for creating a record: attribute name to typed value
#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub attributes: BTreeMap<String, AttributeValue>,
}

/// Query parameters for listing records, optionally filtered by one attribute
#[derive(Debug, Default, Deserialize)]
pub struct RecordQuery {
    pub attribute: Option<String>,
    pub value: Option<String>,
}

impl RecordQuery {
    /// The equality filter, if any. Identifiers are matched as identifiers.
    pub fn filter(&self) -> Result<Option<(&str, AttributeValue)>, String> {
        match (self.attribute.as_deref(), self.value.as_deref()) {
            (None, None) => Ok(None),
            (Some(attribute), Some(value)) if !attribute.is_empty() => {
                let value = match Uuid::parse_str(value) {
                    Ok(id) => AttributeValue::Guid(id),
                    Err(_) => AttributeValue::String(value.to_string()),
                };
                Ok(Some((attribute, value)))
            }
            _ => Err("Both 'attribute' and 'value' are required to filter records".to_string()),
        }
    }
}

/// A clone setting with all of its rules
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneSettingDetails {
    pub specification: CloneSpecification,
    pub attributes: Vec<AttributeRule>,
    pub relationships: Vec<RelationshipRule>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordCreatedResponse {
    pub entity_name: String,
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct RecordListResponse {
    pub records: Vec<Record>,
    pub total: usize,
}
