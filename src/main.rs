//! Crewdeck server binary.
//!
//! Wires the store, runner and event hub together, then serves the
//! execution REST API and the `/ws` event stream.

use std::net::SocketAddr;

use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crewdeck::{
    config::ServerConfig, create_execution_router, AppState, EventHub, ExecutionRunner,
    ExecutionStore, SimulationScript,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crewdeck=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Crewdeck server");

    let config = ServerConfig::from_env();
    let store = ExecutionStore::new();
    let hub = EventHub::new();
    let script = SimulationScript::with_interval(config.tick_interval);
    let runner = ExecutionRunner::new(store.clone(), hub.clone(), script);
    let state = AppState::new(store, runner, hub);

    // CORS for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_execution_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Crewdeck server running on http://{}", addr);
    tracing::info!("API Endpoints:");
    tracing::info!("  POST /api/executions          - Start an execution");
    tracing::info!("  GET  /api/executions          - List executions");
    tracing::info!("  GET  /api/executions/:id      - Fetch an execution");
    tracing::info!("  PUT  /api/executions/:id/stop - Stop an execution");
    tracing::info!("  GET  /ws                      - Live execution events");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            if e.kind() == std::io::ErrorKind::AddrInUse {
                tracing::error!("Port {} is already in use", config.port);
            }
            return Err(format!("Failed to bind to {}: {}", addr, e).into());
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        return Err(format!("Server error: {}", e).into());
    }

    Ok(())
}
