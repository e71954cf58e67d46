//! Crewdeck — backend for a crew management console.
//!
//! The core is the real-time execution-update pipeline: the control
//! surface creates an execution record, a per-execution runner walks a
//! scripted step sequence on a timer, persists each step through the
//! store and fans events out through the hub to every connected
//! WebSocket observer.

pub mod api;
pub mod config;
pub mod hub;
pub mod model;
pub mod observer;
pub mod runner;
pub mod script;
pub mod store;

pub use api::{create_execution_router, AppState};
pub use hub::EventHub;
pub use model::{
    CreateExecutionRequest, ExecutionEvent, ExecutionMetrics, ExecutionPatch, ExecutionRecord,
    ExecutionStatus,
};
pub use runner::{ExecutionRunner, RunnerError};
pub use script::SimulationScript;
pub use store::{ExecutionStore, StoreError};
