//! Clone Engine Module
//!
//! The two pipelines that share the clone specification model:
//!
//! 1. **Discovery**: introspect an entity type and persist a clone
//!    specification (attribute allow-list + relationship rules)
//! 2. **Clone**: copy one record using a specification, then duplicate or
//!    reassociate its related records

pub mod activity;
pub mod clone;
pub mod discovery;
pub mod report;

// Re-export main types for convenient access
pub use activity::{is_activity, is_address_relationship};
pub use clone::{CloneEngine, CloneOutcome};
pub use discovery::SettingsDiscovery;
pub use report::{
    DiscoverySummary, EntryStatus, LogEntry, LogEntrySource, RelatedCloneReport, RelatedFailure,
    SkipReason, SkippedRelationship,
};
