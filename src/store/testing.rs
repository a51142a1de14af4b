//! Test doubles for the store traits

use super::{InMemoryStore, MetadataProvider, RecordStore};
use crate::error::StoreError;
use crate::models::{AttributeValue, ColumnSet, EntityMetadata, Record, Reference};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

type CreateFilter = Box<dyn Fn(&Record) -> bool + Send + Sync>;

/// Wraps an [`InMemoryStore`], counts calls and fails chosen creates
pub(crate) struct RecordingStore {
    pub inner: Arc<InMemoryStore>,
    creates: AtomicUsize,
    associates: AtomicUsize,
    fail_create: Mutex<Option<CreateFilter>>,
    fail_associate: Mutex<bool>,
    fail_update: Mutex<bool>,
}

impl RecordingStore {
    pub fn new(inner: Arc<InMemoryStore>) -> Self {
        Self {
            inner,
            creates: AtomicUsize::new(0),
            associates: AtomicUsize::new(0),
            fail_create: Mutex::new(None),
            fail_associate: Mutex::new(false),
            fail_update: Mutex::new(false),
        }
    }

    /// Reject every create whose record matches `filter`
    pub fn fail_creates_when(&self, filter: impl Fn(&Record) -> bool + Send + Sync + 'static) {
        *self.fail_create.lock().unwrap() = Some(Box::new(filter));
    }

    pub fn fail_associates(&self) {
        *self.fail_associate.lock().unwrap() = true;
    }

    pub fn fail_updates(&self) {
        *self.fail_update.lock().unwrap() = true;
    }

    /// Successful and failed create calls
    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn associate_calls(&self) -> usize {
        self.associates.load(Ordering::SeqCst)
    }

    pub fn reset_counts(&self) {
        self.creates.store(0, Ordering::SeqCst);
        self.associates.store(0, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl RecordStore for RecordingStore {
    async fn retrieve(
        &self,
        entity_name: &str,
        id: Uuid,
        columns: &ColumnSet,
    ) -> Result<Record, StoreError> {
        self.inner.retrieve(entity_name, id, columns).await
    }

    async fn create(&self, record: Record) -> Result<Uuid, StoreError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let rejected = self
            .fail_create
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|f| f(&record));
        if rejected {
            return Err(StoreError::Rejected(format!(
                "create of {} refused",
                record.entity_name
            )));
        }
        self.inner.create(record).await
    }

    async fn update(&self, record: Record) -> Result<(), StoreError> {
        let refused = *self.fail_update.lock().unwrap();
        if refused {
            return Err(StoreError::Rejected("update refused".to_string()));
        }
        self.inner.update(record).await
    }

    async fn associate(
        &self,
        entity_name: &str,
        id: Uuid,
        relationship: &str,
        related: Vec<Reference>,
    ) -> Result<(), StoreError> {
        self.associates.fetch_add(1, Ordering::SeqCst);
        let refused = *self.fail_associate.lock().unwrap();
        if refused {
            return Err(StoreError::Rejected("associate refused".to_string()));
        }
        self.inner.associate(entity_name, id, relationship, related).await
    }

    async fn query(
        &self,
        entity_name: &str,
        columns: &ColumnSet,
        filter_attribute: &str,
        filter_value: &AttributeValue,
    ) -> Result<Vec<Record>, StoreError> {
        self.inner
            .query(entity_name, columns, filter_attribute, filter_value)
            .await
    }
}

#[async_trait::async_trait]
impl MetadataProvider for RecordingStore {
    async fn describe_entity(&self, entity_name: &str) -> Result<EntityMetadata, StoreError> {
        self.inner.describe_entity(entity_name).await
    }
}
