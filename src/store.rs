//! Record store interfaces
//!
//! The engines reach the platform only through these two traits. Every call
//! is awaited before the next one is issued; implementations own their own
//! concurrency control.

pub mod memory;
pub mod spec_store;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::StoreError;
use crate::models::{AttributeValue, ColumnSet, EntityMetadata, Record, Reference};
use uuid::Uuid;

pub use memory::{Association, InMemoryStore};
pub use spec_store::SpecStore;

/// CRUD, query and associate operations on typed records
#[async_trait::async_trait]
pub trait RecordStore: Send + Sync {
    /// Load one record with the requested columns
    async fn retrieve(
        &self,
        entity_name: &str,
        id: Uuid,
        columns: &ColumnSet,
    ) -> Result<Record, StoreError>;

    /// Persist a new record and return its identity
    async fn create(&self, record: Record) -> Result<Uuid, StoreError>;

    /// Merge the record's attributes into the stored record with the same identity
    async fn update(&self, record: Record) -> Result<(), StoreError>;

    /// Link `related` records to the record `(entity_name, id)` under a relationship
    async fn associate(
        &self,
        entity_name: &str,
        id: Uuid,
        relationship: &str,
        related: Vec<Reference>,
    ) -> Result<(), StoreError>;

    /// All records of `entity_name` whose `filter_attribute` equals `filter_value`
    async fn query(
        &self,
        entity_name: &str,
        columns: &ColumnSet,
        filter_attribute: &str,
        filter_value: &AttributeValue,
    ) -> Result<Vec<Record>, StoreError>;
}

/// Schema introspection
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    async fn describe_entity(&self, entity_name: &str) -> Result<EntityMetadata, StoreError>;
}
