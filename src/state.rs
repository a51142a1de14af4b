//! Application state management
//!
//! Contains shared state accessible across all handlers.

use crate::config::CloneDefaults;
use crate::engine::{CloneEngine, SettingsDiscovery};
use crate::store::{InMemoryStore, SpecStore};
use crate::trigger::TriggerDispatcher;
use std::sync::Arc;

/// Application state shared across all handlers
pub struct AppState {
    /// Record store and metadata provider
    pub store: Arc<InMemoryStore>,

    /// Clone specifications persisted in `store`
    pub specs: SpecStore,

    pub discovery: SettingsDiscovery,

    pub engine: CloneEngine,

    /// Raw trigger events
    pub dispatcher: TriggerDispatcher,

    /// Affixes for clone settings created without their own
    pub defaults: CloneDefaults,
}

impl AppState {
    /// Wire both pipelines to one store
    pub fn new(store: Arc<InMemoryStore>, defaults: CloneDefaults) -> Self {
        let specs = SpecStore::new(store.clone());
        let discovery = SettingsDiscovery::new(store.clone(), specs.clone());
        let engine = CloneEngine::new(store.clone(), specs.clone());
        let dispatcher = TriggerDispatcher::new(discovery.clone(), engine.clone());

        Self {
            store,
            specs,
            discovery,
            engine,
            dispatcher,
            defaults,
        }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;
