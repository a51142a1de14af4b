//! Trigger events
//!
//! Platform events arrive as a message name plus loosely-typed parameters.
//! They are validated into a [`TriggerEvent`] and routed to the matching
//! pipeline by [`TriggerDispatcher`].

use crate::engine::{CloneEngine, CloneOutcome, DiscoverySummary, SettingsDiscovery};
use crate::error::CloneError;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

/// Message raised after a clone specification record is created
pub const DISCOVER_MESSAGE: &str = "Create";

/// Message raised to clone one record with a specification
pub const CLONE_MESSAGE: &str = "CloneRecord";

pub const SPECIFICATION_ID_PARAM: &str = "specificationId";
pub const ENTITY_NAME_PARAM: &str = "entityName";
pub const ENTITY_ID_PARAM: &str = "entityId";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerEvent {
    DiscoverSettings {
        specification_id: Uuid,
        entity_name: String,
    },
    CloneRecord {
        specification_id: Uuid,
        entity_name: String,
        entity_id: Uuid,
    },
}

impl TriggerEvent {
    /// Validate a raw event. Message names are matched case-insensitively.
    pub fn parse(message: &str, parameters: &Map<String, Value>) -> Result<Self, CloneError> {
        let specification_id = uuid_param(parameters, SPECIFICATION_ID_PARAM)?;
        let entity_name = string_param(parameters, ENTITY_NAME_PARAM)?.to_string();

        if message.eq_ignore_ascii_case(DISCOVER_MESSAGE) {
            Ok(TriggerEvent::DiscoverSettings {
                specification_id,
                entity_name,
            })
        } else if message.eq_ignore_ascii_case(CLONE_MESSAGE) {
            Ok(TriggerEvent::CloneRecord {
                specification_id,
                entity_name,
                entity_id: uuid_param(parameters, ENTITY_ID_PARAM)?,
            })
        } else {
            Err(CloneError::InvalidTriggerPayload(format!(
                "unsupported message '{}'",
                message
            )))
        }
    }
}

fn string_param<'a>(parameters: &'a Map<String, Value>, name: &str) -> Result<&'a str, CloneError> {
    match parameters.get(name) {
        None | Some(Value::Null) => Err(CloneError::InvalidTriggerPayload(format!(
            "missing parameter '{}'",
            name
        ))),
        Some(Value::String(s)) if s.trim().is_empty() => Err(CloneError::InvalidTriggerPayload(
            format!("parameter '{}' is empty", name),
        )),
        Some(Value::String(s)) => Ok(s.trim()),
        Some(other) => Err(CloneError::InvalidTriggerPayload(format!(
            "parameter '{}' must be a string, got {}",
            name, other
        ))),
    }
}

fn uuid_param(parameters: &Map<String, Value>, name: &str) -> Result<Uuid, CloneError> {
    let raw = string_param(parameters, name)?;
    Uuid::parse_str(raw).map_err(|e| {
        CloneError::InvalidTriggerPayload(format!(
            "parameter '{}' is not a valid identifier: {}",
            name, e
        ))
    })
}

/// What a dispatched event produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "camelCase")]
pub enum TriggerOutcome {
    Discovered(DiscoverySummary),
    Cloned(CloneOutcome),
}

/// Routes trigger events to the discovery or clone pipeline
#[derive(Clone)]
pub struct TriggerDispatcher {
    discovery: SettingsDiscovery,
    engine: CloneEngine,
}

impl TriggerDispatcher {
    pub fn new(discovery: SettingsDiscovery, engine: CloneEngine) -> Self {
        Self { discovery, engine }
    }

    pub async fn dispatch(&self, event: TriggerEvent) -> Result<TriggerOutcome, CloneError> {
        info!("⚡ Dispatching trigger {:?}", event);
        match event {
            TriggerEvent::DiscoverSettings {
                specification_id,
                entity_name,
            } => self
                .discovery
                .discover_and_persist(&entity_name, specification_id)
                .await
                .map(TriggerOutcome::Discovered),
            TriggerEvent::CloneRecord {
                specification_id,
                entity_name,
                entity_id,
            } => self
                .engine
                .clone_record(specification_id, &entity_name, entity_id)
                .await
                .map(TriggerOutcome::Cloned),
        }
    }

    /// Parse and dispatch a raw event
    pub async fn handle(
        &self,
        message: &str,
        parameters: &Map<String, Value>,
    ) -> Result<TriggerOutcome, CloneError> {
        let event = TriggerEvent::parse(message, parameters)?;
        self.dispatch(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttributeMetadata, EntityMetadata, Record};
    use crate::store::{InMemoryStore, RecordStore, SpecStore};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("parameters must be an object"),
        }
    }

    fn dispatcher(store: Arc<InMemoryStore>) -> (SpecStore, TriggerDispatcher) {
        let specs = SpecStore::new(store.clone());
        let discovery = SettingsDiscovery::new(store.clone(), specs.clone());
        let engine = CloneEngine::new(store, specs.clone());
        (specs, TriggerDispatcher::new(discovery, engine))
    }

    #[test]
    fn test_parse_clone_event() {
        let spec_id = Uuid::new_v4();
        let entity_id = Uuid::new_v4();
        let event = TriggerEvent::parse(
            "clonerecord",
            &params(json!({
                "specificationId": spec_id.to_string(),
                "entityName": " account ",
                "entityId": entity_id.to_string(),
            })),
        )
        .unwrap();

        assert_eq!(
            event,
            TriggerEvent::CloneRecord {
                specification_id: spec_id,
                entity_name: "account".to_string(),
                entity_id,
            }
        );
    }

    #[test]
    fn test_parse_rejects_bad_payloads() {
        let spec_id = Uuid::new_v4().to_string();
        let cases = [
            ("CloneRecord", json!({ "specificationId": spec_id, "entityName": "account" })),
            ("CloneRecord", json!({ "specificationId": spec_id, "entityName": "", "entityId": spec_id })),
            ("CloneRecord", json!({ "specificationId": "not-a-guid", "entityName": "account", "entityId": spec_id })),
            ("Create", json!({ "specificationId": spec_id, "entityName": 42 })),
            ("Create", json!({ "specificationId": null, "entityName": "account" })),
            ("Delete", json!({ "specificationId": spec_id, "entityName": "account" })),
        ];

        for (message, payload) in cases {
            let result = TriggerEvent::parse(message, &params(payload));
            assert!(
                matches!(result, Err(CloneError::InvalidTriggerPayload(_))),
                "{} accepted",
                message
            );
        }
    }

    #[tokio::test]
    async fn test_handle_runs_discovery_then_clone() {
        let store = Arc::new(InMemoryStore::new());
        let mut contact = EntityMetadata::new("contact", "contactid", "fullname");
        contact.attributes = vec![
            AttributeMetadata::new("contactid", "uniqueidentifier").primary_id(),
            AttributeMetadata::new("fullname", "string").labelled("Full Name").primary_name(),
            AttributeMetadata::new("jobtitle", "string").labelled("Job Title"),
        ];
        store.register_entity(contact).await;
        let (specs, dispatcher) = dispatcher(store.clone());

        let spec = specs
            .create_specification("Contacts", "contact", "", " (clone)")
            .await
            .unwrap();
        let discovered = dispatcher
            .handle(
                "Create",
                &params(json!({
                    "specificationId": spec.id.to_string(),
                    "entityName": "contact",
                })),
            )
            .await
            .unwrap();
        assert!(matches!(
            discovered,
            TriggerOutcome::Discovered(ref s) if s.attributes_created == 3
        ));

        let source_id = store
            .create(Record::new("contact").with("jobtitle", "Engineer"))
            .await
            .unwrap();
        let cloned = dispatcher
            .handle(
                "CloneRecord",
                &params(json!({
                    "specificationId": spec.id.to_string(),
                    "entityName": "contact",
                    "entityId": source_id.to_string(),
                })),
            )
            .await
            .unwrap();

        let TriggerOutcome::Cloned(outcome) = cloned else {
            panic!("expected a clone outcome");
        };
        assert_eq!(outcome.target_name, " (clone)");
        let target = store
            .retrieve("contact", outcome.target_id, &crate::models::ColumnSet::All)
            .await
            .unwrap();
        assert_eq!(target.text("jobtitle"), "Engineer");
        assert_eq!(target.text("fullname"), " (clone)");
    }
}
