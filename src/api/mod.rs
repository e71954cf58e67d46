//! HTTP + WebSocket surface.

pub mod execution_routes;
pub mod ws;

use crate::hub::EventHub;
use crate::runner::ExecutionRunner;
use crate::store::ExecutionStore;

/// Shared state for the execution routes and the WebSocket endpoint.
#[derive(Clone)]
pub struct AppState {
    pub store: ExecutionStore,
    pub runner: ExecutionRunner,
    pub hub: EventHub,
}

impl AppState {
    pub fn new(store: ExecutionStore, runner: ExecutionRunner, hub: EventHub) -> Self {
        Self { store, runner, hub }
    }
}

pub use execution_routes::create_execution_router;
