//! Route definitions and router setup
//!
//! Configures all API routes and middleware.

mod clone_settings;
mod metadata;
mod records;
mod triggers;

use crate::config::Settings;
use crate::state::SharedState;
use axum::{
    http::{header, Method},
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::MakeRequestUuid,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
    ServiceBuilderExt,
};
use tracing::Level;

/// Create the application router with all routes and middleware
pub fn create_router(state: SharedState, settings: &Settings) -> Router {
    // Build CORS layer
    let cors = build_cors_layer(settings);

    // Build tracing/logging layer
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    // Build middleware stack
    let middleware = ServiceBuilder::new()
        .set_x_request_id(MakeRequestUuid)
        .layer(trace_layer)
        .layer(CompressionLayer::new())
        .layer(cors)
        .propagate_x_request_id();

    // Build the router
    Router::new()
        // Health check
        .route("/health", get(health_check))

        // Metadata routes
        .route("/api/metadata/entities", post(metadata::register_entity))
        .route("/api/metadata/entities/{entity}", get(metadata::describe_entity))

        // Record routes
        .route(
            "/api/records/{entity}",
            post(records::create_record).get(records::list_records),
        )
        .route("/api/records/{entity}/{id}", get(records::get_record))

        // Clone setting routes
        .route("/api/clone-settings", post(clone_settings::create_clone_setting))
        .route("/api/clone-settings/{id}", get(clone_settings::get_clone_setting))
        .route(
            "/api/clone-settings/{id}/relationships/{rule_id}",
            put(clone_settings::set_relationship_mode),
        )
        .route("/api/clone-settings/{id}/clone", post(clone_settings::clone_record))

        // Raw trigger events
        .route("/api/triggers", post(triggers::handle_trigger))

        // Apply middleware and state
        .layer(middleware)
        .with_state(state)
}

/// Build CORS layer from settings
fn build_cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<_> = settings
        .cors
        .allowed_origins
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect();

    let methods = [Method::GET, Method::POST, Method::PUT, Method::OPTIONS];
    let headers = [header::CONTENT_TYPE, header::ACCEPT];

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(Duration::from_secs(3600))
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(Duration::from_secs(3600))
    }
}

/// Health check endpoint
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "success": true,
        "message": "Server is running fine.",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;
    use crate::store::InMemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> Router {
        let settings = Settings::default();
        let state = Arc::new(AppState::new(
            Arc::new(InMemoryStore::new()),
            settings.defaults.clone(),
        ));
        create_router(state, &settings)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(match body {
                Some(value) => Body::from(value.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn guid(id: &str) -> Value {
        json!({ "type": "guid", "value": id })
    }

    #[tokio::test]
    async fn test_health_check() {
        let (status, body) = send(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], json!(true));
    }

    #[tokio::test]
    async fn test_clone_setting_flow() {
        let app = app();

        // Schema
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/metadata/entities",
            Some(json!({
                "logicalName": "account",
                "primaryIdAttribute": "accountid",
                "primaryNameAttribute": "name",
                "attributes": [
                    { "logicalName": "accountid", "attributeType": "uniqueidentifier", "isPrimaryId": true },
                    { "logicalName": "name", "attributeType": "string",
                      "displayName": [{ "label": "Account Name" }], "isPrimaryName": true }
                ],
                "oneToManyRelationships": [{
                    "schemaName": "account_orders",
                    "referencedEntity": "account",
                    "referencedAttribute": "accountid",
                    "referencingEntity": "order",
                    "referencingAttribute": "accountid"
                }]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        send(
            &app,
            Method::POST,
            "/api/metadata/entities",
            Some(json!({
                "logicalName": "order",
                "primaryIdAttribute": "orderid",
                "primaryNameAttribute": "name"
            })),
        )
        .await;

        // Data
        let (_, created) = send(
            &app,
            Method::POST,
            "/api/records/account",
            Some(json!({ "attributes": { "name": { "type": "string", "value": "Acme Corp" } } })),
        )
        .await;
        let account_id = created["id"].as_str().unwrap().to_string();
        send(
            &app,
            Method::POST,
            "/api/records/order",
            Some(json!({ "attributes": {
                "name": { "type": "string", "value": "Order 1" },
                "accountid": guid(&account_id)
            } })),
        )
        .await;

        // Clone setting with discovery
        let (status, summary) = send(
            &app,
            Method::POST,
            "/api/clone-settings",
            Some(json!({ "entityName": "account", "prefix": "Copy of " })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(summary["attributesCreated"], json!(2));
        assert_eq!(summary["oneToManyCreated"], json!(1));
        let spec_id = summary["specificationId"].as_str().unwrap().to_string();

        let (_, details) = send(&app, Method::GET, &format!("/api/clone-settings/{}", spec_id), None).await;
        let rule_id = details["relationships"][0]["id"].as_str().unwrap().to_string();
        assert_eq!(details["relationships"][0]["mode"], json!("disabled"));

        let (status, rule) = send(
            &app,
            Method::PUT,
            &format!("/api/clone-settings/{}/relationships/{}", spec_id, rule_id),
            Some(json!({ "mode": "duplicate" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(rule["mode"], json!("duplicate"));

        // Clone
        let (status, outcome) = send(
            &app,
            Method::POST,
            &format!("/api/clone-settings/{}/clone", spec_id),
            Some(json!({ "entityName": "account", "entityId": account_id })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(outcome["targetName"], json!("Copy of Acme Corp"));
        assert_eq!(outcome["related"]["created"].as_array().unwrap().len(), 1);

        let target_id = outcome["targetId"].as_str().unwrap();
        let (_, orders) = send(
            &app,
            Method::GET,
            &format!("/api/records/order?attribute=accountid&value={}", target_id),
            None,
        )
        .await;
        assert_eq!(orders["total"], json!(1));
    }

    #[tokio::test]
    async fn test_invalid_trigger_is_bad_request() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/triggers",
            Some(json!({
                "message": "CloneRecord",
                "parameters": { "specificationId": "not-a-guid", "entityName": "account" }
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], json!("INVALID_TRIGGER_PAYLOAD"));
    }

    #[tokio::test]
    async fn test_discovery_trigger_for_unknown_setting_is_404() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/triggers",
            Some(json!({
                "message": "Create",
                "parameters": {
                    "specificationId": uuid::Uuid::new_v4().to_string(),
                    "entityName": "account"
                }
            })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], json!("RETRIEVE_FAILED"));
    }

    #[tokio::test]
    async fn test_clone_setting_for_unknown_entity_is_404() {
        let (status, body) = send(
            &app(),
            Method::POST,
            "/api/clone-settings",
            Some(json!({ "entityName": "ghost" })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], json!("SCHEMA_NOT_FOUND"));
    }

    #[tokio::test]
    async fn test_missing_record_is_404() {
        let uri = format!("/api/records/account/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&app(), Method::GET, &uri, None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], json!(false));
    }
}
