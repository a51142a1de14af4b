//! Clone specification storage
//!
//! Persists specifications and their attribute/relationship rules as
//! ordinary records in a [`RecordStore`]. Relationship modes are stored as
//! status codes and resolved into [`PropagationMode`] when rules are read.

use super::RecordStore;
use crate::error::StoreError;
use crate::models::{
    AttributeRule, AttributeValue, CloneSpecification, ColumnSet, PropagationMode, Record,
    Reference, RelationshipRule, RelationshipShape,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Entity and attribute names of the configuration records
pub mod schema {
    pub const SPECIFICATION: &str = "clone_specification";
    pub const ATTRIBUTE_RULE: &str = "clone_attribute_rule";
    pub const RELATIONSHIP_RULE: &str = "clone_relationship_rule";
    pub const NN_RELATIONSHIP_RULE: &str = "clone_nn_relationship_rule";

    pub const SPECIFICATION_ID: &str = "specificationid";
    pub const NAME: &str = "name";
    pub const ENTITY_NAME: &str = "entityname";
    pub const PREFIX: &str = "prefix";
    pub const SUFFIX: &str = "suffix";
    pub const PRIMARY_ID_ATTRIBUTE: &str = "primaryidattribute";
    pub const PRIMARY_NAME_ATTRIBUTE: &str = "primarynameattribute";

    pub const LOGICAL_NAME: &str = "logicalname";
    pub const DISPLAY_NAME: &str = "displayname";
    pub const ATTRIBUTE_TYPE: &str = "attributetype";
    pub const IS_PRIMARY: &str = "isprimary";

    pub const ATTRIBUTE_NAME: &str = "attributename";
    pub const ENTITY1_NAME: &str = "entity1name";
    pub const ATTRIBUTE1_NAME: &str = "attribute1name";
    pub const ENTITY2_NAME: &str = "entity2name";
    pub const ATTRIBUTE2_NAME: &str = "attribute2name";

    pub const STATE_CODE: &str = "statecode";
    pub const STATUS_CODE: &str = "statuscode";

    pub const STATE_ACTIVE: i32 = 0;
    pub const STATE_INACTIVE: i32 = 1;
}

/// Specification store backed by a record store
#[derive(Clone)]
pub struct SpecStore {
    store: Arc<dyn RecordStore>,
}

impl SpecStore {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Create an empty specification for `entity_name`
    pub async fn create_specification(
        &self,
        name: &str,
        entity_name: &str,
        prefix: &str,
        suffix: &str,
    ) -> Result<CloneSpecification, StoreError> {
        let record = Record::new(schema::SPECIFICATION)
            .with(schema::NAME, name)
            .with(schema::ENTITY_NAME, entity_name)
            .with(schema::PREFIX, prefix)
            .with(schema::SUFFIX, suffix);
        let id = self.store.create(record).await?;

        info!("Created clone specification '{}' ({}) for {}", name, id, entity_name);
        Ok(CloneSpecification {
            id,
            name: name.to_string(),
            entity_name: entity_name.to_string(),
            primary_id_attribute: String::new(),
            primary_name_attribute: String::new(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
        })
    }

    pub async fn load_specification(&self, id: Uuid) -> Result<CloneSpecification, StoreError> {
        let record = self
            .store
            .retrieve(schema::SPECIFICATION, id, &ColumnSet::All)
            .await?;

        Ok(CloneSpecification {
            id,
            name: record.text(schema::NAME),
            entity_name: record.text(schema::ENTITY_NAME),
            primary_id_attribute: record.text(schema::PRIMARY_ID_ATTRIBUTE),
            primary_name_attribute: record.text(schema::PRIMARY_NAME_ATTRIBUTE),
            prefix: record.text(schema::PREFIX),
            suffix: record.text(schema::SUFFIX),
        })
    }

    /// Bind the specification's primary-key and primary-name attribute names
    pub async fn update_primary_attributes(
        &self,
        id: Uuid,
        primary_id_attribute: &str,
        primary_name_attribute: &str,
    ) -> Result<(), StoreError> {
        let record = Record::with_id(schema::SPECIFICATION, id)
            .with(schema::PRIMARY_ID_ATTRIBUTE, primary_id_attribute)
            .with(schema::PRIMARY_NAME_ATTRIBUTE, primary_name_attribute);
        self.store.update(record).await
    }

    pub async fn create_attribute_rule(&self, rule: &AttributeRule) -> Result<Uuid, StoreError> {
        let record = Record::new(schema::ATTRIBUTE_RULE)
            .with(schema::SPECIFICATION_ID, specification_ref(rule.specification_id))
            .with(schema::LOGICAL_NAME, rule.logical_name.as_str())
            .with(schema::DISPLAY_NAME, rule.display_name.as_str())
            .with(schema::ATTRIBUTE_TYPE, rule.attribute_type.as_str())
            .with(schema::IS_PRIMARY, rule.is_primary)
            .with(schema::STATE_CODE, AttributeValue::OptionSet(schema::STATE_ACTIVE));
        self.store.create(record).await
    }

    /// Active attribute rules of a specification
    pub async fn load_attribute_rules(
        &self,
        specification_id: Uuid,
    ) -> Result<Vec<AttributeRule>, StoreError> {
        let records = self
            .rules_of(schema::ATTRIBUTE_RULE, specification_id)
            .await?;

        Ok(records
            .iter()
            .filter(|r| is_active(r))
            .map(|r| AttributeRule {
                id: r.id,
                specification_id,
                logical_name: r.text(schema::LOGICAL_NAME),
                display_name: r.text(schema::DISPLAY_NAME),
                attribute_type: r.text(schema::ATTRIBUTE_TYPE),
                is_primary: r
                    .get(schema::IS_PRIMARY)
                    .and_then(AttributeValue::as_bool)
                    .unwrap_or(false),
            })
            .collect())
    }

    /// Store a relationship rule. Names are unique within a specification.
    pub async fn create_relationship_rule(
        &self,
        rule: &RelationshipRule,
    ) -> Result<Uuid, StoreError> {
        let existing = self.load_relationship_rules(rule.specification_id).await?;
        if existing.iter().any(|r| r.name == rule.name) {
            return Err(StoreError::Conflict(format!(
                "relationship rule '{}' already exists in specification {}",
                rule.name, rule.specification_id
            )));
        }

        let state = if rule.mode.is_enabled() {
            schema::STATE_ACTIVE
        } else {
            schema::STATE_INACTIVE
        };

        let mut record = match &rule.shape {
            RelationshipShape::OneToMany {
                entity_name,
                attribute_name,
                primary_id_attribute,
                primary_name_attribute,
            } => Record::new(schema::RELATIONSHIP_RULE)
                .with(schema::ENTITY_NAME, entity_name.as_str())
                .with(schema::ATTRIBUTE_NAME, attribute_name.as_str())
                .with(schema::PRIMARY_ID_ATTRIBUTE, primary_id_attribute.as_str())
                .with(schema::PRIMARY_NAME_ATTRIBUTE, primary_name_attribute.as_str()),
            RelationshipShape::ManyToMany {
                entity1_name,
                attribute1_name,
                entity2_name,
                attribute2_name,
            } => Record::new(schema::NN_RELATIONSHIP_RULE)
                .with(schema::ENTITY1_NAME, entity1_name.as_str())
                .with(schema::ATTRIBUTE1_NAME, attribute1_name.as_str())
                .with(schema::ENTITY2_NAME, entity2_name.as_str())
                .with(schema::ATTRIBUTE2_NAME, attribute2_name.as_str()),
        };
        record.set(schema::SPECIFICATION_ID, specification_ref(rule.specification_id));
        record.set(schema::NAME, rule.name.as_str());
        record.set(schema::STATE_CODE, AttributeValue::OptionSet(state));
        record.set(
            schema::STATUS_CODE,
            AttributeValue::OptionSet(rule.mode.status_code()),
        );

        self.store.create(record).await
    }

    /// Every relationship rule of a specification, one-to-many first
    pub async fn load_relationship_rules(
        &self,
        specification_id: Uuid,
    ) -> Result<Vec<RelationshipRule>, StoreError> {
        let one_to_many = self
            .rules_of(schema::RELATIONSHIP_RULE, specification_id)
            .await?;
        let many_to_many = self
            .rules_of(schema::NN_RELATIONSHIP_RULE, specification_id)
            .await?;

        Ok(one_to_many
            .iter()
            .chain(many_to_many.iter())
            .map(|r| relationship_rule_from_record(specification_id, r))
            .collect())
    }

    /// Operator action: choose how one relationship propagates
    pub async fn set_relationship_mode(
        &self,
        specification_id: Uuid,
        rule_id: Uuid,
        mode: PropagationMode,
    ) -> Result<RelationshipRule, StoreError> {
        let mut rule = self
            .load_relationship_rules(specification_id)
            .await?
            .into_iter()
            .find(|r| r.id == Some(rule_id))
            .ok_or_else(|| StoreError::NotFound {
                entity_name: schema::RELATIONSHIP_RULE.to_string(),
                id: rule_id,
            })?;

        let entity_name = if rule.is_one_to_many() {
            schema::RELATIONSHIP_RULE
        } else {
            schema::NN_RELATIONSHIP_RULE
        };
        let state = if mode.is_enabled() {
            schema::STATE_ACTIVE
        } else {
            schema::STATE_INACTIVE
        };
        let record = Record::with_id(entity_name, rule_id)
            .with(schema::STATE_CODE, AttributeValue::OptionSet(state))
            .with(schema::STATUS_CODE, AttributeValue::OptionSet(mode.status_code()));
        self.store.update(record).await?;

        debug!("Relationship rule '{}' set to {:?}", rule.name, mode);
        rule.mode = mode;
        Ok(rule)
    }

    async fn rules_of(
        &self,
        entity_name: &str,
        specification_id: Uuid,
    ) -> Result<Vec<Record>, StoreError> {
        self.store
            .query(
                entity_name,
                &ColumnSet::All,
                schema::SPECIFICATION_ID,
                &AttributeValue::Guid(specification_id),
            )
            .await
    }
}

fn specification_ref(id: Uuid) -> Reference {
    Reference::new(schema::SPECIFICATION, id)
}

fn is_active(record: &Record) -> bool {
    record
        .get(schema::STATE_CODE)
        .and_then(AttributeValue::as_option_set)
        .unwrap_or(schema::STATE_ACTIVE)
        == schema::STATE_ACTIVE
}

fn relationship_rule_from_record(specification_id: Uuid, record: &Record) -> RelationshipRule {
    let shape = if record.entity_name == schema::NN_RELATIONSHIP_RULE {
        RelationshipShape::ManyToMany {
            entity1_name: record.text(schema::ENTITY1_NAME),
            attribute1_name: record.text(schema::ATTRIBUTE1_NAME),
            entity2_name: record.text(schema::ENTITY2_NAME),
            attribute2_name: record.text(schema::ATTRIBUTE2_NAME),
        }
    } else {
        RelationshipShape::OneToMany {
            entity_name: record.text(schema::ENTITY_NAME),
            attribute_name: record.text(schema::ATTRIBUTE_NAME),
            primary_id_attribute: record.text(schema::PRIMARY_ID_ATTRIBUTE),
            primary_name_attribute: record.text(schema::PRIMARY_NAME_ATTRIBUTE),
        }
    };

    // An inactive rule never propagates, whatever its status code says.
    let mode = if is_active(record) {
        record
            .get(schema::STATUS_CODE)
            .and_then(AttributeValue::as_option_set)
            .map(PropagationMode::from_status_code)
            .unwrap_or_default()
    } else {
        PropagationMode::Disabled
    };

    RelationshipRule {
        id: record.id,
        specification_id,
        name: record.text(schema::NAME),
        shape,
        mode,
    }
}
