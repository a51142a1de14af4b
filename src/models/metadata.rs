//! Entity metadata as reported by a metadata provider

use serde::{Deserialize, Serialize};

/// Type tag of computed, non-storable attributes
pub const VIRTUAL_ATTRIBUTE_TYPE: &str = "virtual";

/// Type tag of plain text attributes
pub const STRING_ATTRIBUTE_TYPE: &str = "string";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizedLabel {
    pub label: String,
    #[serde(default = "default_language_code")]
    pub language_code: i32,
}

fn default_language_code() -> i32 {
    1033
}

impl LocalizedLabel {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            language_code: default_language_code(),
        }
    }
}

/// Attribute (column) metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMetadata {
    pub logical_name: String,
    pub attribute_type: String,
    #[serde(default)]
    pub display_name: Vec<LocalizedLabel>,
    #[serde(default)]
    pub is_primary_id: bool,
    #[serde(default)]
    pub is_primary_name: bool,
}

impl AttributeMetadata {
    pub fn new(logical_name: impl Into<String>, attribute_type: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            attribute_type: attribute_type.into(),
            display_name: Vec::new(),
            is_primary_id: false,
            is_primary_name: false,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.display_name.push(LocalizedLabel::new(label));
        self
    }

    pub fn primary_id(mut self) -> Self {
        self.is_primary_id = true;
        self
    }

    pub fn primary_name(mut self) -> Self {
        self.is_primary_name = true;
        self
    }

    /// First localized label, or an empty string
    pub fn display_label(&self) -> &str {
        self.display_name
            .first()
            .map(|l| l.label.as_str())
            .unwrap_or("")
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary_id || self.is_primary_name
    }

    /// Case-insensitive comparison of the type tag
    pub fn has_type(&self, tag: &str) -> bool {
        self.attribute_type.eq_ignore_ascii_case(tag)
    }
}

/// One-to-many relationship: `referenced_entity` is the parent (one) side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneToManyRelationshipMetadata {
    pub schema_name: String,
    pub referenced_entity: String,
    pub referenced_attribute: String,
    pub referencing_entity: String,
    pub referencing_attribute: String,
}

/// Many-to-many relationship through an intersect entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManyToManyRelationshipMetadata {
    pub schema_name: String,
    pub entity1_logical_name: String,
    pub entity1_intersect_attribute: String,
    pub entity2_logical_name: String,
    pub entity2_intersect_attribute: String,
    #[serde(default)]
    pub intersect_entity_name: String,
}

/// Full description of one entity type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMetadata {
    pub logical_name: String,
    pub primary_id_attribute: String,
    pub primary_name_attribute: String,
    #[serde(default)]
    pub attributes: Vec<AttributeMetadata>,
    #[serde(default)]
    pub one_to_many_relationships: Vec<OneToManyRelationshipMetadata>,
    #[serde(default)]
    pub many_to_many_relationships: Vec<ManyToManyRelationshipMetadata>,
}

impl EntityMetadata {
    pub fn new(
        logical_name: impl Into<String>,
        primary_id_attribute: impl Into<String>,
        primary_name_attribute: impl Into<String>,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            primary_id_attribute: primary_id_attribute.into(),
            primary_name_attribute: primary_name_attribute.into(),
            attributes: Vec::new(),
            one_to_many_relationships: Vec::new(),
            many_to_many_relationships: Vec::new(),
        }
    }

    pub fn one_to_many(&self, schema_name: &str) -> Option<&OneToManyRelationshipMetadata> {
        self.one_to_many_relationships
            .iter()
            .find(|r| r.schema_name == schema_name)
    }

    pub fn many_to_many(&self, schema_name: &str) -> Option<&ManyToManyRelationshipMetadata> {
        self.many_to_many_relationships
            .iter()
            .find(|r| r.schema_name == schema_name)
    }
}
