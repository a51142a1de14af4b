//! Results reported by the discovery and clone pipelines

use crate::error::CloneError;
use crate::models::Reference;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntrySource {
    Attribute,
    OneToManyRelationship,
    ManyToManyRelationship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Success,
    Skipped,
}

/// One line of the discovery log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub source: LogEntrySource,
    pub name: String,
    pub status: EntryStatus,
    pub description: String,
}

/// What a discovery run created and skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverySummary {
    pub specification_id: Uuid,
    pub entity_name: String,
    pub primary_id_attribute: String,
    pub primary_name_attribute: String,
    pub attributes_created: usize,
    pub attributes_skipped: usize,
    pub one_to_many_created: usize,
    pub one_to_many_skipped: usize,
    pub many_to_many_created: usize,
    pub many_to_many_skipped: usize,
    pub entries: Vec<LogEntry>,
}

impl DiscoverySummary {
    pub fn new(specification_id: Uuid, entity_name: &str) -> Self {
        Self {
            specification_id,
            entity_name: entity_name.to_string(),
            primary_id_attribute: String::new(),
            primary_name_attribute: String::new(),
            attributes_created: 0,
            attributes_skipped: 0,
            one_to_many_created: 0,
            one_to_many_skipped: 0,
            many_to_many_created: 0,
            many_to_many_skipped: 0,
            entries: Vec::new(),
        }
    }

    pub(crate) fn record(
        &mut self,
        source: LogEntrySource,
        name: &str,
        status: EntryStatus,
        description: impl Into<String>,
    ) {
        match (source, status) {
            (LogEntrySource::Attribute, EntryStatus::Success) => self.attributes_created += 1,
            (LogEntrySource::Attribute, EntryStatus::Skipped) => self.attributes_skipped += 1,
            (LogEntrySource::OneToManyRelationship, EntryStatus::Success) => {
                self.one_to_many_created += 1
            }
            (LogEntrySource::OneToManyRelationship, EntryStatus::Skipped) => {
                self.one_to_many_skipped += 1
            }
            (LogEntrySource::ManyToManyRelationship, EntryStatus::Success) => {
                self.many_to_many_created += 1
            }
            (LogEntrySource::ManyToManyRelationship, EntryStatus::Skipped) => {
                self.many_to_many_skipped += 1
            }
        }
        self.entries.push(LogEntry {
            source,
            name: name.to_string(),
            status,
            description: description.into(),
        });
    }
}

/// Why a relationship rule was passed over at clone time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// One of the fixed address relationships
    AddressRelationship,
    /// Foreign key or related primary name attribute is not bound
    MissingBindings,
    /// Many-to-many propagation is not performed
    ManyToManyUnsupported,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedRelationship {
    pub relationship: String,
    pub reason: SkipReason,
}

/// A related-record operation that failed without stopping the clone
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFailure {
    pub relationship: String,
    /// The matched related record, absent when the lookup itself failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub related: Option<Reference>,
    pub code: &'static str,
    pub message: String,
}

impl RelatedFailure {
    pub fn new(relationship: &str, related: Option<Reference>, error: &CloneError) -> Self {
        Self {
            relationship: relationship.to_string(),
            related,
            code: error.code(),
            message: error.detailed_message(),
        }
    }
}

/// Accumulated outcome of the related-record phase
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedCloneReport {
    /// New related records created in Duplicate mode
    pub created: Vec<Reference>,
    /// Existing related records linked in Reassociate mode
    pub associated: Vec<Reference>,
    pub skipped: Vec<SkippedRelationship>,
    pub failed: Vec<RelatedFailure>,
}

impl RelatedCloneReport {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub(crate) fn skip(&mut self, relationship: &str, reason: SkipReason) {
        self.skipped.push(SkippedRelationship {
            relationship: relationship.to_string(),
            reason,
        });
    }
}
