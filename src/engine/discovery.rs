//! Settings discovery
//!
//! Introspects an entity type and materializes a clone specification from
//! it: one attribute rule per copyable attribute and one relationship rule
//! per child or many-to-many relationship. Relationship rules start out
//! Disabled; an operator enables them afterwards.

use super::activity::is_activity;
use super::report::{DiscoverySummary, EntryStatus, LogEntrySource};
use crate::error::{CloneError, StoreError};
use crate::models::{
    AttributeMetadata, AttributeRule, EntityMetadata, ManyToManyRelationshipMetadata,
    OneToManyRelationshipMetadata, PropagationMode, RelationshipRule, RelationshipShape,
    STRING_ATTRIBUTE_TYPE, VIRTUAL_ATTRIBUTE_TYPE,
};
use crate::store::spec_store::schema;
use crate::store::{MetadataProvider, SpecStore};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Builds clone specifications from live entity metadata
#[derive(Clone)]
pub struct SettingsDiscovery {
    metadata: Arc<dyn MetadataProvider>,
    specs: SpecStore,
}

impl SettingsDiscovery {
    pub fn new(metadata: Arc<dyn MetadataProvider>, specs: SpecStore) -> Self {
        Self { metadata, specs }
    }

    /// Describe `entity_name` and persist its rules under `specification_id`.
    ///
    /// Rules created before a failure stay in place. Running it again only
    /// adds what is missing.
    #[instrument(skip(self))]
    pub async fn discover_and_persist(
        &self,
        entity_name: &str,
        specification_id: Uuid,
    ) -> Result<DiscoverySummary, CloneError> {
        info!("🔍 Discovering clone settings for '{}'", entity_name);

        let spec = self
            .specs
            .load_specification(specification_id)
            .await
            .map_err(|source| CloneError::RetrieveFailed {
                entity_name: schema::SPECIFICATION.to_string(),
                id: specification_id,
                source,
            })?;
        if !spec.entity_name.is_empty() && spec.entity_name != entity_name {
            return Err(CloneError::EntityMismatch {
                specification_id,
                expected: spec.entity_name,
                actual: entity_name.to_string(),
            });
        }

        // Rules stored by an earlier run are kept as they are
        let allowed: HashSet<String> = self
            .specs
            .load_attribute_rules(specification_id)
            .await
            .map_err(|source| rule_query_failed(schema::ATTRIBUTE_RULE, source))?
            .into_iter()
            .map(|rule| rule.logical_name)
            .collect();
        let mut seen: HashSet<String> = self
            .specs
            .load_relationship_rules(specification_id)
            .await
            .map_err(|source| rule_query_failed(schema::RELATIONSHIP_RULE, source))?
            .into_iter()
            .map(|rule| rule.name)
            .collect();

        let entity = self.describe(entity_name).await?;
        let mut summary = DiscoverySummary::new(specification_id, entity_name);

        // 1. Attribute allow-list
        for attribute in &entity.attributes {
            if allowed.contains(&attribute.logical_name) {
                summary.record(
                    LogEntrySource::Attribute,
                    &attribute.logical_name,
                    EntryStatus::Skipped,
                    "already in the allow-list",
                );
                continue;
            }
            match attribute_rule_for(specification_id, attribute) {
                Some(rule) => {
                    self.specs
                        .create_attribute_rule(&rule)
                        .await
                        .map_err(|source| CloneError::PersistenceFailure {
                            what: format!("attribute rule '{}'", rule.logical_name),
                            source,
                        })?;
                    summary.record(
                        LogEntrySource::Attribute,
                        &attribute.logical_name,
                        EntryStatus::Success,
                        format!("{} attribute added", attribute.attribute_type),
                    );
                }
                None => summary.record(
                    LogEntrySource::Attribute,
                    &attribute.logical_name,
                    EntryStatus::Skipped,
                    skip_description(attribute),
                ),
            }
        }

        // 2. Child relationships, parent side only
        for relationship in entity
            .one_to_many_relationships
            .iter()
            .filter(|r| r.referenced_entity == entity_name)
        {
            if !seen.insert(relationship.schema_name.clone()) {
                summary.record(
                    LogEntrySource::OneToManyRelationship,
                    &relationship.schema_name,
                    EntryStatus::Skipped,
                    "duplicate relationship name",
                );
                continue;
            }
            if is_activity(&relationship.referencing_entity) {
                summary.record(
                    LogEntrySource::OneToManyRelationship,
                    &relationship.schema_name,
                    EntryStatus::Skipped,
                    format!("{} is an activity", relationship.referencing_entity),
                );
                continue;
            }

            let child = self.describe(&relationship.referencing_entity).await?;
            let rule = one_to_many_rule(specification_id, relationship, &child);
            self.persist_relationship_rule(&rule).await?;
            summary.record(
                LogEntrySource::OneToManyRelationship,
                &relationship.schema_name,
                EntryStatus::Success,
                format!(
                    "{} via {}",
                    relationship.referencing_entity, relationship.referencing_attribute
                ),
            );
        }

        // 3. Many-to-many relationships
        for relationship in &entity.many_to_many_relationships {
            if !seen.insert(relationship.schema_name.clone()) {
                summary.record(
                    LogEntrySource::ManyToManyRelationship,
                    &relationship.schema_name,
                    EntryStatus::Skipped,
                    "duplicate relationship name",
                );
                continue;
            }

            let rule = many_to_many_rule(specification_id, relationship);
            self.persist_relationship_rule(&rule).await?;
            summary.record(
                LogEntrySource::ManyToManyRelationship,
                &relationship.schema_name,
                EntryStatus::Success,
                format!(
                    "{} <-> {}",
                    relationship.entity1_logical_name, relationship.entity2_logical_name
                ),
            );
        }

        // 4. Primary attribute bindings
        self.specs
            .update_primary_attributes(
                specification_id,
                &entity.primary_id_attribute,
                &entity.primary_name_attribute,
            )
            .await
            .map_err(|source| CloneError::PersistenceFailure {
                what: format!("primary attributes of specification {}", specification_id),
                source,
            })?;
        summary.primary_id_attribute = entity.primary_id_attribute.clone();
        summary.primary_name_attribute = entity.primary_name_attribute.clone();

        info!(
            "🔍 Discovery complete for '{}': attributes={}, one-to-many={}, many-to-many={}, skipped={}",
            entity_name,
            summary.attributes_created,
            summary.one_to_many_created,
            summary.many_to_many_created,
            summary.attributes_skipped + summary.one_to_many_skipped + summary.many_to_many_skipped
        );
        Ok(summary)
    }

    async fn describe(&self, entity_name: &str) -> Result<EntityMetadata, CloneError> {
        self.metadata
            .describe_entity(entity_name)
            .await
            .map_err(|source| CloneError::SchemaNotFound {
                entity_name: entity_name.to_string(),
                source,
            })
    }

    async fn persist_relationship_rule(&self, rule: &RelationshipRule) -> Result<(), CloneError> {
        let id = self
            .specs
            .create_relationship_rule(rule)
            .await
            .map_err(|source| CloneError::PersistenceFailure {
                what: format!("relationship rule '{}'", rule.name),
                source,
            })?;
        debug!("Relationship rule '{}' stored as {}", rule.name, id);
        Ok(())
    }
}

fn rule_query_failed(entity_name: &str, source: StoreError) -> CloneError {
    CloneError::QueryFailed {
        entity_name: entity_name.to_string(),
        attribute: schema::SPECIFICATION_ID.to_string(),
        source,
    }
}

/// The attribute rule for one attribute, or `None` when it is not copyable.
///
/// Virtual attributes are skipped, as are string attributes without a
/// display label. Everything else is copied verbatim.
pub fn attribute_rule_for(
    specification_id: Uuid,
    attribute: &AttributeMetadata,
) -> Option<AttributeRule> {
    if attribute.has_type(VIRTUAL_ATTRIBUTE_TYPE) {
        return None;
    }
    let label = attribute.display_label();
    if attribute.has_type(STRING_ATTRIBUTE_TYPE) && label.is_empty() {
        return None;
    }

    Some(AttributeRule {
        id: None,
        specification_id,
        logical_name: attribute.logical_name.clone(),
        display_name: label.to_string(),
        attribute_type: attribute.attribute_type.clone(),
        is_primary: attribute.is_primary(),
    })
}

fn skip_description(attribute: &AttributeMetadata) -> &'static str {
    if attribute.has_type(VIRTUAL_ATTRIBUTE_TYPE) {
        "virtual attribute"
    } else {
        "string attribute without a display label"
    }
}

fn one_to_many_rule(
    specification_id: Uuid,
    relationship: &OneToManyRelationshipMetadata,
    child: &EntityMetadata,
) -> RelationshipRule {
    RelationshipRule {
        id: None,
        specification_id,
        name: relationship.schema_name.clone(),
        shape: RelationshipShape::OneToMany {
            entity_name: relationship.referencing_entity.clone(),
            attribute_name: relationship.referencing_attribute.clone(),
            primary_id_attribute: child.primary_id_attribute.clone(),
            primary_name_attribute: child.primary_name_attribute.clone(),
        },
        mode: PropagationMode::Disabled,
    }
}

fn many_to_many_rule(
    specification_id: Uuid,
    relationship: &ManyToManyRelationshipMetadata,
) -> RelationshipRule {
    RelationshipRule {
        id: None,
        specification_id,
        name: relationship.schema_name.clone(),
        shape: RelationshipShape::ManyToMany {
            entity1_name: relationship.entity1_logical_name.clone(),
            attribute1_name: relationship.entity1_intersect_attribute.clone(),
            entity2_name: relationship.entity2_logical_name.clone(),
            attribute2_name: relationship.entity2_intersect_attribute.clone(),
        },
        mode: PropagationMode::Disabled,
    }
}
