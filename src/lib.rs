//! recordclone - metadata-driven record cloning
//!
//! Two pipelines share one clone specification model:
//! - **Discovery** turns an entity type's live schema into a clone
//!   specification (attribute allow-list + relationship rules)
//! - **Clone** copies one record with a specification and duplicates or
//!   reassociates its related records
//!
//! The record store and metadata service are reached through the traits in
//! [`store`]; [`store::InMemoryStore`] is the bundled implementation.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod trigger;
