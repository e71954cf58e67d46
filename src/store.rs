//! In-memory execution record store.
//!
//! An explicitly constructed, clone-able handle over a shared map — no
//! process-wide singleton, so every test gets a fresh instance. The runner
//! never holds a record pointer; every tick goes through `update` as a
//! read-modify-write keyed by execution id.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::model::{
    CreateExecutionRequest, ExecutionMetrics, ExecutionPatch, ExecutionRecord, ExecutionStatus,
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("execution {0} not found")]
    NotFound(Uuid),
}

/// Shared store of execution records, safe for concurrent access across
/// different execution ids.
#[derive(Clone, Default)]
pub struct ExecutionStore {
    records: Arc<RwLock<HashMap<Uuid, ExecutionRecord>>>,
}

impl ExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new record with a fresh id, `Running` status and the
    /// creation timestamp. The id is the only handle callers keep.
    pub async fn create(&self, req: CreateExecutionRequest) -> ExecutionRecord {
        let record = ExecutionRecord {
            id: Uuid::new_v4(),
            crew_id: req.crew_id,
            status: ExecutionStatus::Running,
            output: req.output.unwrap_or_default(),
            metrics: ExecutionMetrics {
                tokens_used: req.tokens_used.unwrap_or(0),
                api_calls: req.api_calls.unwrap_or(0),
                estimated_cost: req.estimated_cost.unwrap_or(0.0),
                duration: req.duration.unwrap_or(0),
            },
            started_at: Utc::now(),
            completed_at: None,
        };
        self.records
            .write()
            .await
            .insert(record.id, record.clone());
        record
    }

    pub async fn get(&self, id: Uuid) -> Option<ExecutionRecord> {
        self.records.read().await.get(&id).cloned()
    }

    pub async fn list(&self) -> Vec<ExecutionRecord> {
        self.records.read().await.values().cloned().collect()
    }

    /// Apply a partial update and return the new record state.
    ///
    /// `completed_at` is stamped exactly once, on the transition into
    /// `Completed`; later patches never overwrite it.
    pub async fn update(
        &self,
        id: Uuid,
        patch: ExecutionPatch,
    ) -> Result<ExecutionRecord, StoreError> {
        let mut records = self.records.write().await;
        let record = records.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if let Some(output) = patch.output {
            record.output = output;
        }
        if let Some(metrics) = patch.metrics {
            record.metrics = metrics;
        }
        if let Some(status) = patch.status {
            record.status = status;
            if status == ExecutionStatus::Completed && record.completed_at.is_none() {
                record.completed_at = Some(Utc::now());
            }
        }

        Ok(record.clone())
    }
}
