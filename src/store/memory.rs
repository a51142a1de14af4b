//! In-memory record store
//!
//! Reference implementation of [`RecordStore`] and [`MetadataProvider`].
//! Records are kept per entity type; registered entity metadata drives
//! primary-key stamping and relationship-aware associate.

use super::{MetadataProvider, RecordStore};
use crate::error::StoreError;
use crate::models::{AttributeValue, ColumnSet, EntityMetadata, Record, Reference};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// A many-to-many link recorded by [`InMemoryStore::associate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Association {
    pub relationship: String,
    pub primary: Reference,
    pub related: Reference,
}

/// Thread-safe in-memory store
pub struct InMemoryStore {
    /// Entity name -> (Id -> Record)
    records: Arc<RwLock<HashMap<String, HashMap<Uuid, Record>>>>,
    /// Entity name -> metadata
    metadata: Arc<RwLock<HashMap<String, EntityMetadata>>>,
    associations: Arc<RwLock<Vec<Association>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            metadata: Arc::new(RwLock::new(HashMap::new())),
            associations: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register or replace the metadata of one entity type
    pub async fn register_entity(&self, metadata: EntityMetadata) {
        debug!(
            "Registering entity '{}' with {} attributes",
            metadata.logical_name,
            metadata.attributes.len()
        );
        let mut entities = self.metadata.write().await;
        entities.insert(metadata.logical_name.clone(), metadata);
    }

    /// All records of one entity type
    pub async fn list(&self, entity_name: &str) -> Vec<Record> {
        let records = self.records.read().await;
        records
            .get(entity_name)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Many-to-many links recorded so far
    #[cfg(test)]
    pub(crate) async fn associations(&self) -> Vec<Association> {
        self.associations.read().await.clone()
    }

    async fn primary_id_attribute(&self, entity_name: &str) -> Option<String> {
        let entities = self.metadata.read().await;
        entities
            .get(entity_name)
            .map(|m| m.primary_id_attribute.clone())
            .filter(|a| !a.is_empty())
    }

    fn project(record: &Record, columns: &ColumnSet) -> Record {
        match columns {
            ColumnSet::All => record.clone(),
            ColumnSet::Columns(_) => Record {
                entity_name: record.entity_name.clone(),
                id: record.id,
                attributes: record
                    .attributes
                    .iter()
                    .filter(|(name, _)| columns.includes(name))
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
            },
        }
    }

    /// Point each related record's foreign key at the primary record
    async fn relink(
        &self,
        primary: &Reference,
        referencing_entity: &str,
        referencing_attribute: &str,
        related: &[Reference],
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        for reference in related {
            if reference.entity_name != referencing_entity {
                return Err(StoreError::Rejected(format!(
                    "{} cannot be linked through a relationship to {}",
                    reference, referencing_entity
                )));
            }
            let record = records
                .get_mut(&reference.entity_name)
                .and_then(|m| m.get_mut(&reference.id))
                .ok_or_else(|| StoreError::NotFound {
                    entity_name: reference.entity_name.clone(),
                    id: reference.id,
                })?;

            let current = record.get(referencing_attribute).and_then(AttributeValue::as_id);
            if current == Some(primary.id) {
                return Err(StoreError::Conflict(format!(
                    "{} is already associated with {}",
                    reference, primary
                )));
            }
            record.set(referencing_attribute, primary.clone());
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RecordStore for InMemoryStore {
    async fn retrieve(
        &self,
        entity_name: &str,
        id: Uuid,
        columns: &ColumnSet,
    ) -> Result<Record, StoreError> {
        let records = self.records.read().await;
        records
            .get(entity_name)
            .and_then(|m| m.get(&id))
            .map(|r| Self::project(r, columns))
            .ok_or_else(|| StoreError::NotFound {
                entity_name: entity_name.to_string(),
                id,
            })
    }

    async fn create(&self, mut record: Record) -> Result<Uuid, StoreError> {
        if record.entity_name.is_empty() {
            return Err(StoreError::Rejected("record has no entity name".to_string()));
        }

        let id = record.id.unwrap_or_else(Uuid::new_v4);
        record.id = Some(id);
        if let Some(primary_id) = self.primary_id_attribute(&record.entity_name).await {
            record.set(primary_id, AttributeValue::Guid(id));
        }

        let mut records = self.records.write().await;
        let entity_records = records
            .entry(record.entity_name.clone())
            .or_insert_with(HashMap::new);
        if entity_records.contains_key(&id) {
            return Err(StoreError::Conflict(format!(
                "{} with id {} already exists",
                record.entity_name, id
            )));
        }

        debug!("Created {} {}", record.entity_name, id);
        entity_records.insert(id, record);
        Ok(id)
    }

    async fn update(&self, record: Record) -> Result<(), StoreError> {
        let id = record.id.ok_or_else(|| {
            StoreError::Rejected(format!("{} update is missing an id", record.entity_name))
        })?;

        let mut records = self.records.write().await;
        let stored = records
            .get_mut(&record.entity_name)
            .and_then(|m| m.get_mut(&id))
            .ok_or_else(|| StoreError::NotFound {
                entity_name: record.entity_name.clone(),
                id,
            })?;

        stored.attributes.extend(record.attributes);
        Ok(())
    }

    async fn associate(
        &self,
        entity_name: &str,
        id: Uuid,
        relationship: &str,
        related: Vec<Reference>,
    ) -> Result<(), StoreError> {
        let primary = Reference::new(entity_name, id);
        self.retrieve(entity_name, id, &ColumnSet::columns(Vec::<String>::new()))
            .await?;

        let metadata = self
            .describe_entity(entity_name)
            .await?;

        if let Some(rel) = metadata.one_to_many(relationship) {
            return self
                .relink(&primary, &rel.referencing_entity, &rel.referencing_attribute, &related)
                .await;
        }

        if metadata.many_to_many(relationship).is_none() {
            return Err(StoreError::Rejected(format!(
                "relationship '{}' is not defined on {}",
                relationship, entity_name
            )));
        }

        let mut links = self.associations.write().await;
        for reference in related {
            let link = Association {
                relationship: relationship.to_string(),
                primary: primary.clone(),
                related: reference,
            };
            if links.contains(&link) {
                return Err(StoreError::Conflict(format!(
                    "{} is already associated with {} via '{}'",
                    link.related, primary, relationship
                )));
            }
            links.push(link);
        }
        Ok(())
    }

    async fn query(
        &self,
        entity_name: &str,
        columns: &ColumnSet,
        filter_attribute: &str,
        filter_value: &AttributeValue,
    ) -> Result<Vec<Record>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .get(entity_name)
            .map(|m| {
                m.values()
                    .filter(|r| {
                        r.get(filter_attribute)
                            .is_some_and(|v| v.matches(filter_value))
                    })
                    .map(|r| Self::project(r, columns))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[async_trait::async_trait]
impl MetadataProvider for InMemoryStore {
    async fn describe_entity(&self, entity_name: &str) -> Result<EntityMetadata, StoreError> {
        let entities = self.metadata.read().await;
        entities
            .get(entity_name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownEntity(entity_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ManyToManyRelationshipMetadata, OneToManyRelationshipMetadata};
    use pretty_assertions::assert_eq;

    async fn store_with_accounts() -> InMemoryStore {
        let store = InMemoryStore::new();
        let mut account = EntityMetadata::new("account", "accountid", "name");
        account.one_to_many_relationships.push(OneToManyRelationshipMetadata {
            schema_name: "account_orders".to_string(),
            referenced_entity: "account".to_string(),
            referenced_attribute: "accountid".to_string(),
            referencing_entity: "order".to_string(),
            referencing_attribute: "accountid".to_string(),
        });
        account.many_to_many_relationships.push(ManyToManyRelationshipMetadata {
            schema_name: "account_competitors".to_string(),
            entity1_logical_name: "account".to_string(),
            entity1_intersect_attribute: "accountid".to_string(),
            entity2_logical_name: "competitor".to_string(),
            entity2_intersect_attribute: "competitorid".to_string(),
            intersect_entity_name: "accountcompetitors".to_string(),
        });
        store.register_entity(account).await;
        store.register_entity(EntityMetadata::new("order", "orderid", "name")).await;
        store
    }

    #[tokio::test]
    async fn test_create_stamps_primary_key() {
        let store = store_with_accounts().await;
        let id = store
            .create(Record::new("account").with("name", "Acme"))
            .await
            .unwrap();

        let record = store.retrieve("account", id, &ColumnSet::All).await.unwrap();
        assert_eq!(record.get("accountid"), Some(&AttributeValue::Guid(id)));
        assert_eq!(record.text("name"), "Acme");
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_identity() {
        let store = InMemoryStore::new();
        let id = Uuid::new_v4();
        store.create(Record::with_id("account", id)).await.unwrap();

        let result = store.create(Record::with_id("account", id)).await;
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_retrieve_projects_columns() {
        let store = InMemoryStore::new();
        let id = store
            .create(Record::new("account").with("name", "Acme").with("revenue", 10.5))
            .await
            .unwrap();

        let record = store
            .retrieve("account", id, &ColumnSet::columns(["name"]))
            .await
            .unwrap();
        assert_eq!(record.attributes.len(), 1);
        assert_eq!(record.id, Some(id));
    }

    #[tokio::test]
    async fn test_query_matches_references_by_id() {
        let store = store_with_accounts().await;
        let account_id = store.create(Record::new("account")).await.unwrap();
        let other_id = store.create(Record::new("account")).await.unwrap();
        for owner in [account_id, account_id, other_id] {
            store
                .create(Record::new("order").with("accountid", Reference::new("account", owner)))
                .await
                .unwrap();
        }

        let orders = store
            .query(
                "order",
                &ColumnSet::All,
                "accountid",
                &AttributeValue::Guid(account_id),
            )
            .await
            .unwrap();
        assert_eq!(orders.len(), 2);
    }

    #[tokio::test]
    async fn test_update_merges_attributes() {
        let store = InMemoryStore::new();
        let id = store
            .create(Record::new("account").with("name", "Acme"))
            .await
            .unwrap();

        store
            .update(Record::with_id("account", id).with("telephone1", "555-0100"))
            .await
            .unwrap();

        let record = store.retrieve("account", id, &ColumnSet::All).await.unwrap();
        assert_eq!(record.text("name"), "Acme");
        assert_eq!(record.text("telephone1"), "555-0100");
    }

    #[tokio::test]
    async fn test_associate_one_to_many_relinks_child() {
        let store = store_with_accounts().await;
        let old_parent = store.create(Record::new("account")).await.unwrap();
        let new_parent = store.create(Record::new("account")).await.unwrap();
        let order = store
            .create(Record::new("order").with("accountid", Reference::new("account", old_parent)))
            .await
            .unwrap();

        store
            .associate(
                "account",
                new_parent,
                "account_orders",
                vec![Reference::new("order", order)],
            )
            .await
            .unwrap();

        let record = store.retrieve("order", order, &ColumnSet::All).await.unwrap();
        assert_eq!(
            record.get("accountid"),
            Some(&AttributeValue::Reference(Reference::new("account", new_parent)))
        );

        let again = store
            .associate(
                "account",
                new_parent,
                "account_orders",
                vec![Reference::new("order", order)],
            )
            .await;
        assert!(matches!(again, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_associate_many_to_many_records_link() {
        let store = store_with_accounts().await;
        let account = store.create(Record::new("account")).await.unwrap();
        let competitor = Reference::new("competitor", Uuid::new_v4());

        store
            .associate("account", account, "account_competitors", vec![competitor.clone()])
            .await
            .unwrap();

        assert_eq!(
            store.associations().await,
            vec![Association {
                relationship: "account_competitors".to_string(),
                primary: Reference::new("account", account),
                related: competitor,
            }]
        );
    }

    #[tokio::test]
    async fn test_associate_unknown_relationship_is_rejected() {
        let store = store_with_accounts().await;
        let account = store.create(Record::new("account")).await.unwrap();

        let result = store
            .associate("account", account, "account_tasks", vec![])
            .await;
        assert!(matches!(result, Err(StoreError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_describe_unknown_entity() {
        let store = InMemoryStore::new();
        let result = store.describe_entity("invoice").await;

        assert_eq!(result, Err(StoreError::UnknownEntity("invoice".to_string())));
    }
}
