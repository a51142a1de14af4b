//! Clone execution
//!
//! Copies one primary record according to its clone specification, then
//! walks the specification's relationship rules. Per related record, a
//! Duplicate rule creates a relinked copy and a Reassociate rule links the
//! existing record to the new primary. Only a failed primary create aborts;
//! everything after it is collected into a [`RelatedCloneReport`].

use super::activity::{is_address_id, is_address_relationship};
use super::report::{RelatedCloneReport, RelatedFailure, SkipReason};
use crate::error::CloneError;
use crate::models::{
    AttributeValue, CloneSpecification, ColumnSet, PropagationMode, Record, Reference,
    RelationshipRule, RelationshipShape,
};
use crate::store::spec_store::schema;
use crate::store::{RecordStore, SpecStore};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Result of a successful clone
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneOutcome {
    pub source: Reference,
    pub target_id: Uuid,
    pub target_name: String,
    pub related: RelatedCloneReport,
}

/// Executes clone specifications against a record store
#[derive(Clone)]
pub struct CloneEngine {
    store: Arc<dyn RecordStore>,
    specs: SpecStore,
}

impl CloneEngine {
    pub fn new(store: Arc<dyn RecordStore>, specs: SpecStore) -> Self {
        Self { store, specs }
    }

    /// Clone `entity_name` record `entity_id` using specification `specification_id`
    #[instrument(skip(self))]
    pub async fn clone_record(
        &self,
        specification_id: Uuid,
        entity_name: &str,
        entity_id: Uuid,
    ) -> Result<CloneOutcome, CloneError> {
        // 1. Specification and its allow-list
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
            warn!(
                "Specification {} targets '{}' but is applied to '{}'",
                spec.id, spec.entity_name, entity_name
            );
        }

        let allowed: HashSet<String> = self
            .specs
            .load_attribute_rules(specification_id)
            .await
            .map_err(|source| rule_query_failed(schema::ATTRIBUTE_RULE, source))?
            .into_iter()
            .map(|rule| rule.logical_name)
            .collect();

        // 2. Source record
        let source = self
            .store
            .retrieve(entity_name, entity_id, &ColumnSet::All)
            .await
            .map_err(|source| CloneError::RetrieveFailed {
                entity_name: entity_name.to_string(),
                id: entity_id,
                source,
            })?;

        // 3-4. Primary copy
        let target_name = spec.target_name(&source.text(&spec.primary_name_attribute));
        let copy = build_primary_copy(&spec, &source, &allowed, &target_name);
        let target_id = self
            .store
            .create(copy)
            .await
            .map_err(|source| CloneError::CreateFailed {
                entity_name: entity_name.to_string(),
                source,
            })?;
        info!(
            "📋 Cloned {}({}) as {} '{}'",
            entity_name, entity_id, target_id, target_name
        );

        // 5. Related records
        let target = Reference::new(entity_name, target_id);
        let related = match self.specs.load_relationship_rules(specification_id).await {
            Ok(rules) => self.clone_related(&rules, entity_id, &target).await,
            Err(source) => {
                let error = rule_query_failed(schema::RELATIONSHIP_RULE, source);
                warn!("Related phase skipped: {}", error.detailed_message());
                RelatedCloneReport {
                    failed: vec![RelatedFailure::new("", None, &error)],
                    ..Default::default()
                }
            }
        };

        info!(
            "📋 Related phase done: created={}, associated={}, skipped={}, failed={}",
            related.created.len(),
            related.associated.len(),
            related.skipped.len(),
            related.failed.len()
        );

        Ok(CloneOutcome {
            source: Reference::new(entity_name, entity_id),
            target_id,
            target_name,
            related,
        })
    }

    /// Apply every relationship rule, one store call at a time
    async fn clone_related(
        &self,
        rules: &[RelationshipRule],
        source_id: Uuid,
        target: &Reference,
    ) -> RelatedCloneReport {
        let mut report = RelatedCloneReport::default();

        for rule in rules {
            let duplicate = match rule.mode {
                PropagationMode::Disabled => continue,
                PropagationMode::Duplicate => true,
                PropagationMode::Reassociate => false,
            };
            if is_address_relationship(&rule.name) {
                debug!("Skipping address relationship '{}'", rule.name);
                report.skip(&rule.name, SkipReason::AddressRelationship);
                continue;
            }
            let RelationshipShape::OneToMany {
                entity_name,
                attribute_name,
                primary_id_attribute,
                ..
            } = &rule.shape
            else {
                report.skip(&rule.name, SkipReason::ManyToManyUnsupported);
                continue;
            };
            if !rule.has_required_bindings() {
                warn!("Relationship '{}' is missing its bindings", rule.name);
                report.skip(&rule.name, SkipReason::MissingBindings);
                continue;
            }

            let matches = match self
                .store
                .query(
                    entity_name,
                    &ColumnSet::All,
                    attribute_name,
                    &AttributeValue::Guid(source_id),
                )
                .await
            {
                Ok(records) => records,
                Err(source) => {
                    let error = CloneError::QueryFailed {
                        entity_name: entity_name.clone(),
                        attribute: attribute_name.clone(),
                        source,
                    };
                    warn!("{}", error.detailed_message());
                    report.failed.push(RelatedFailure::new(&rule.name, None, &error));
                    continue;
                }
            };
            debug!(
                "Relationship '{}': {} matching {} record(s)",
                rule.name,
                matches.len(),
                entity_name
            );

            for related in &matches {
                let Some(related_ref) = related.to_reference() else {
                    warn!("{} record without identity ignored", entity_name);
                    continue;
                };

                if duplicate {
                    let copy =
                        build_related_copy(related, primary_id_attribute, attribute_name, target);
                    match self.store.create(copy).await {
                        Ok(id) => report.created.push(Reference::new(entity_name, id)),
                        Err(source) => {
                            let error = CloneError::CreateFailed {
                                entity_name: entity_name.clone(),
                                source,
                            };
                            warn!("{}: {}", related_ref, error.detailed_message());
                            report.failed.push(RelatedFailure::new(
                                &rule.name,
                                Some(related_ref),
                                &error,
                            ));
                        }
                    }
                } else {
                    match self
                        .store
                        .associate(
                            &target.entity_name,
                            target.id,
                            &rule.name,
                            vec![related_ref.clone()],
                        )
                        .await
                    {
                        Ok(()) => report.associated.push(related_ref),
                        Err(source) => {
                            let error = CloneError::AssociateFailed {
                                relationship: rule.name.clone(),
                                entity_name: target.entity_name.clone(),
                                id: target.id,
                                related: related_ref.clone(),
                                source,
                            };
                            warn!("{}", error.detailed_message());
                            report.failed.push(RelatedFailure::new(
                                &rule.name,
                                Some(related_ref),
                                &error,
                            ));
                        }
                    }
                }
            }
        }

        report
    }
}

fn rule_query_failed(entity_name: &str, source: crate::error::StoreError) -> CloneError {
    CloneError::QueryFailed {
        entity_name: entity_name.to_string(),
        attribute: schema::SPECIFICATION_ID.to_string(),
        source,
    }
}

/// The record to create for the primary copy.
///
/// The primary key is never copied, the primary name is always the computed
/// name, and other attributes are copied when allow-listed and not address
/// identities.
pub fn build_primary_copy(
    spec: &CloneSpecification,
    source: &Record,
    allowed: &HashSet<String>,
    target_name: &str,
) -> Record {
    let mut copy = Record::new(source.entity_name.clone());

    for (name, value) in &source.attributes {
        if *name == spec.primary_id_attribute || *name == spec.primary_name_attribute {
            continue;
        }
        if allowed.contains(name) && !is_address_id(name) {
            copy.set(name.clone(), value.clone());
        }
    }

    if !spec.primary_name_attribute.is_empty() {
        copy.set(spec.primary_name_attribute.clone(), target_name);
    }
    copy
}

/// The record to create for a Duplicate-mode copy of `related`
pub fn build_related_copy(
    related: &Record,
    primary_id_attribute: &str,
    foreign_key: &str,
    target: &Reference,
) -> Record {
    let mut copy = Record::new(related.entity_name.clone());

    for (name, value) in &related.attributes {
        if name == primary_id_attribute || name == foreign_key || is_address_id(name) {
            continue;
        }
        copy.set(name.clone(), value.clone());
    }

    copy.set(foreign_key, target.clone());
    copy
}
