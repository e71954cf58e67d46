//! Execution data model and wire shapes.
//!
//! Records are what the store owns and the REST surface returns; events are
//! transient — built by the runner, pushed through the hub to WebSocket
//! sessions, never persisted. All wire shapes serialize camelCase with a
//! snake_case `type` discriminator on events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an execution.
///
/// `Failed` covers both error outcomes and user-initiated stops; the stop
/// endpoint persists `Failed`, matching the management console's behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
}

/// Accumulated metrics for one execution, monotonically non-decreasing
/// while the execution is running.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetrics {
    pub tokens_used: u64,
    pub api_calls: u64,
    pub estimated_cost: f64,
    /// Elapsed seconds, derived from the step index (not wall clock).
    pub duration: u64,
}

/// A single crew execution as held by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRecord {
    pub id: Uuid,
    pub crew_id: Option<Uuid>,
    pub status: ExecutionStatus,
    /// Last step description written by the runner (overwritten each tick).
    pub output: String,
    #[serde(flatten)]
    pub metrics: ExecutionMetrics,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Creation payload for `POST /api/executions`.
///
/// Every field is optional so an empty body starts an execution; the
/// counters seed the record but the runner overwrites them from its script.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExecutionRequest {
    pub crew_id: Option<Uuid>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub tokens_used: Option<u64>,
    #[serde(default)]
    pub api_calls: Option<u64>,
    #[serde(default)]
    pub estimated_cost: Option<f64>,
    #[serde(default)]
    pub duration: Option<u64>,
}

/// Partial update applied through the store's read-modify-write contract.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPatch {
    pub status: Option<ExecutionStatus>,
    pub output: Option<String>,
    pub metrics: Option<ExecutionMetrics>,
}

impl ExecutionPatch {
    /// Patch carrying only a status transition.
    pub fn status(status: ExecutionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Patch written on every runner tick: step text plus derived metrics.
    pub fn progress(output: String, metrics: ExecutionMetrics) -> Self {
        Self {
            status: None,
            output: Some(output),
            metrics: Some(metrics),
        }
    }
}

/// Transient event fanned out to every connected observer session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExecutionEvent {
    #[serde(rename_all = "camelCase")]
    ExecutionUpdate {
        execution_id: Uuid,
        step: String,
        /// Wall-clock time of emission, preformatted for display.
        timestamp: String,
        /// 0–100; reaches exactly 100 on the final update tick.
        progress: u8,
        metrics: ExecutionMetrics,
    },
    #[serde(rename_all = "camelCase")]
    ExecutionCompleted { execution_id: Uuid, message: String },
    #[serde(rename_all = "camelCase")]
    ExecutionStopped { execution_id: Uuid, message: String },
}

impl ExecutionEvent {
    /// The execution this event belongs to.
    pub fn execution_id(&self) -> Uuid {
        match self {
            Self::ExecutionUpdate { execution_id, .. }
            | Self::ExecutionCompleted { execution_id, .. }
            | Self::ExecutionStopped { execution_id, .. } => *execution_id,
        }
    }

    /// True for `execution_completed` and `execution_stopped`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::ExecutionUpdate { .. })
    }
}
