//! Clone specification model
//!
//! A clone specification is the reusable template for cloning one entity
//! type: which attributes are copied and how each relationship propagates.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One configured clone template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneSpecification {
    pub id: Uuid,
    pub name: String,
    pub entity_name: String,
    pub primary_id_attribute: String,
    pub primary_name_attribute: String,
    pub prefix: String,
    pub suffix: String,
}

impl CloneSpecification {
    /// Primary name for the copy of a record named `source_name`
    pub fn target_name(&self, source_name: &str) -> String {
        if source_name.is_empty() {
            format!("{}{}", self.prefix, self.suffix)
        } else {
            format!("{}{}{}", self.prefix, source_name, self.suffix)
        }
    }
}

/// One allow-listed attribute of a specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub specification_id: Uuid,
    pub logical_name: String,
    pub display_name: String,
    pub attribute_type: String,
    pub is_primary: bool,
}

/// How related records follow the primary record into its copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropagationMode {
    /// No action; covers the stored Ignore and Inactive codes
    #[default]
    Disabled,
    Duplicate,
    Reassociate,
}

impl PropagationMode {
    pub const IGNORE_CODE: i32 = 1;
    pub const INACTIVE_CODE: i32 = 2;
    pub const DUPLICATE_CODE: i32 = 3;
    pub const REASSOCIATE_CODE: i32 = 4;

    /// Resolve a stored status code. Unknown codes are disabled.
    pub fn from_status_code(code: i32) -> Self {
        match code {
            Self::DUPLICATE_CODE => PropagationMode::Duplicate,
            Self::REASSOCIATE_CODE => PropagationMode::Reassociate,
            _ => PropagationMode::Disabled,
        }
    }

    pub fn status_code(self) -> i32 {
        match self {
            PropagationMode::Disabled => Self::INACTIVE_CODE,
            PropagationMode::Duplicate => Self::DUPLICATE_CODE,
            PropagationMode::Reassociate => Self::REASSOCIATE_CODE,
        }
    }

    pub fn is_enabled(self) -> bool {
        self != PropagationMode::Disabled
    }
}

/// Shape-specific part of a relationship rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RelationshipShape {
    #[serde(rename_all = "camelCase")]
    OneToMany {
        /// Related (child) entity type
        entity_name: String,
        /// Foreign key on the child pointing at the primary
        attribute_name: String,
        primary_id_attribute: String,
        primary_name_attribute: String,
    },
    #[serde(rename_all = "camelCase")]
    ManyToMany {
        entity1_name: String,
        attribute1_name: String,
        entity2_name: String,
        attribute2_name: String,
    },
}

/// One configured relationship of a specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub specification_id: Uuid,
    pub name: String,
    pub shape: RelationshipShape,
    pub mode: PropagationMode,
}

impl RelationshipRule {
    pub fn is_one_to_many(&self) -> bool {
        matches!(self.shape, RelationshipShape::OneToMany { .. })
    }

    /// Whether the rule has the bindings the clone path needs.
    ///
    /// A one-to-many rule needs both the foreign key and the related primary
    /// name attribute; many-to-many rules never qualify.
    pub fn has_required_bindings(&self) -> bool {
        match &self.shape {
            RelationshipShape::OneToMany {
                attribute_name,
                primary_name_attribute,
                ..
            } => !attribute_name.is_empty() && !primary_name_attribute.is_empty(),
            RelationshipShape::ManyToMany { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(prefix: &str, suffix: &str) -> CloneSpecification {
        CloneSpecification {
            id: Uuid::new_v4(),
            name: "Accounts".to_string(),
            entity_name: "account".to_string(),
            primary_id_attribute: "accountid".to_string(),
            primary_name_attribute: "name".to_string(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        }
    }

    #[test]
    fn test_target_name_with_prefix() {
        assert_eq!(spec("Copy of ", "").target_name("Acme Corp"), "Copy of Acme Corp");
    }

    #[test]
    fn test_target_name_with_empty_source() {
        assert_eq!(spec("", " (clone)").target_name(""), " (clone)");
        assert_eq!(spec("", "").target_name(""), "");
    }

    #[test]
    fn test_status_codes_resolve_to_modes() {
        assert_eq!(PropagationMode::from_status_code(3), PropagationMode::Duplicate);
        assert_eq!(PropagationMode::from_status_code(4), PropagationMode::Reassociate);
        assert_eq!(PropagationMode::from_status_code(1), PropagationMode::Disabled);
        assert_eq!(PropagationMode::from_status_code(2), PropagationMode::Disabled);
        assert_eq!(PropagationMode::from_status_code(99), PropagationMode::Disabled);
    }

    #[test]
    fn test_required_bindings() {
        let mut rule = RelationshipRule {
            id: None,
            specification_id: Uuid::new_v4(),
            name: "account_orders".to_string(),
            shape: RelationshipShape::OneToMany {
                entity_name: "order".to_string(),
                attribute_name: "accountid".to_string(),
                primary_id_attribute: "orderid".to_string(),
                primary_name_attribute: "name".to_string(),
            },
            mode: PropagationMode::Duplicate,
        };
        assert!(rule.has_required_bindings());

        if let RelationshipShape::OneToMany { primary_name_attribute, .. } = &mut rule.shape {
            primary_name_attribute.clear();
        }
        assert!(!rule.has_required_bindings());
    }
}
