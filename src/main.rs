//! recordclone API server
//!
//! Serves the clone engine over HTTP, backed by the in-memory record store:
//! register entity metadata, create records, create clone settings (which
//! runs discovery), choose relationship modes and clone records.

use recordclone::config::Settings;
use recordclone::routes::create_router;
use recordclone::state::AppState;
use recordclone::store::InMemoryStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber for structured logging
    init_tracing();

    info!("🚀 Starting recordclone...");

    // Load configuration
    let settings = Settings::load()?;
    info!("📋 Configuration loaded successfully");

    let store = Arc::new(InMemoryStore::new());
    let state = Arc::new(AppState::new(store, settings.defaults.clone()));

    // Build the router
    let app = create_router(state, &settings);

    // Create socket address
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("🌐 Server listening on http://{}", addr);
    info!("");
    info!("📚 API Endpoints:");
    info!("   ─── Metadata & Records ───");
    info!("   POST /api/metadata/entities            - Register entity metadata");
    info!("   GET  /api/metadata/entities/{{entity}}   - Describe an entity");
    info!("   POST /api/records/{{entity}}             - Create a record");
    info!("   GET  /api/records/{{entity}}             - List or filter records");
    info!("   GET  /api/records/{{entity}}/{{id}}        - Get one record");
    info!("");
    info!("   ─── Cloning ───");
    info!("   POST /api/clone-settings                        - Create setting + discover");
    info!("   GET  /api/clone-settings/{{id}}                   - Setting with rules");
    info!("   PUT  /api/clone-settings/{{id}}/relationships/{{rule}} - Set propagation mode");
    info!("   POST /api/clone-settings/{{id}}/clone             - Clone a record");
    info!("   POST /api/triggers                              - Raw trigger event");
    info!("");

    // Create TCP listener and serve
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("❌ Failed to bind {}: {}", addr, e);
        e
    })?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recordclone=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("📴 Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("📴 Received terminate signal, initiating graceful shutdown...");
        },
    }
}
