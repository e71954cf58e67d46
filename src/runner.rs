//! Execution runner — drives one record through the step script.
//!
//! One spawned task per execution, ticking on a fixed interval. Each tick
//! re-fetches-and-updates the record through the store contract, then
//! publishes an `execution_update` to the hub. The terminal transition
//! (completed or stopped) is owned by whichever side removes the stop
//! handle from the active map first, so exactly one terminal event is
//! ever emitted per execution id.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Local;
use tokio::sync::{oneshot, RwLock};
use tokio::time::{self, Instant, MissedTickBehavior};
use uuid::Uuid;

use crate::hub::EventHub;
use crate::model::{ExecutionEvent, ExecutionPatch, ExecutionRecord, ExecutionStatus};
use crate::script::{SimulationScript, COMPLETION_MESSAGE, STOP_MESSAGE};
use crate::store::{ExecutionStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("execution {0} already has an active runner")]
    AlreadyRunning(Uuid),
}

/// Spawns and cancels per-execution simulation tasks.
///
/// Clone-able; all clones share the store, hub, script and the map of
/// active stop handles.
#[derive(Clone)]
pub struct ExecutionRunner {
    store: ExecutionStore,
    hub: EventHub,
    script: Arc<SimulationScript>,
    active: Arc<RwLock<HashMap<Uuid, oneshot::Sender<()>>>>,
}

impl ExecutionRunner {
    pub fn new(store: ExecutionStore, hub: EventHub, script: SimulationScript) -> Self {
        Self {
            store,
            hub,
            script: Arc::new(script),
            active: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Begin ticking for an execution id. At most one runner per id: a
    /// second start while the first is active is refused.
    ///
    /// The first tick fires one interval after start, so a caller's HTTP
    /// response normally lands before any update event.
    pub async fn start(&self, id: Uuid) -> Result<(), RunnerError> {
        let (stop_tx, stop_rx) = oneshot::channel();
        {
            let mut active = self.active.write().await;
            if active.contains_key(&id) {
                return Err(RunnerError::AlreadyRunning(id));
            }
            active.insert(id, stop_tx);
        }
        tracing::info!(execution_id = %id, steps = self.script.len(), "starting execution runner");

        let runner = self.clone();
        tokio::spawn(async move { runner.run(id, stop_rx).await });
        Ok(())
    }

    /// Cancel the runner for an id and mark the record failed.
    ///
    /// Idempotent: with no active runner (never started, already stopped,
    /// or already completed) the record is returned unchanged and no event
    /// is published. Partial metrics are never rolled back.
    ///
    /// A tick that is mid-flight when the stop lands may still persist and
    /// emit its `execution_update`, on either side of the
    /// `execution_stopped` event. Both orders are accepted interleavings;
    /// the update is deliberately not serialized against the stop.
    pub async fn stop(&self, id: Uuid) -> Result<ExecutionRecord, StoreError> {
        let handle = self.active.write().await.remove(&id);
        match handle {
            Some(stop_tx) => {
                let _ = stop_tx.send(());
                let record = self
                    .store
                    .update(id, ExecutionPatch::status(ExecutionStatus::Failed))
                    .await?;
                self.hub.publish(ExecutionEvent::ExecutionStopped {
                    execution_id: id,
                    message: STOP_MESSAGE.to_string(),
                });
                tracing::info!(execution_id = %id, "execution stopped by user");
                Ok(record)
            }
            None => self.store.get(id).await.ok_or(StoreError::NotFound(id)),
        }
    }

    /// Whether an execution currently has a live runner task.
    pub async fn is_active(&self, id: Uuid) -> bool {
        self.active.read().await.contains_key(&id)
    }

    async fn run(self, id: Uuid, mut stop_rx: oneshot::Receiver<()>) {
        let period = self.script.tick_interval;
        // First tick after one full interval, setInterval-style; Delay
        // keeps ticks from overlapping when a tick outlasts the period.
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut index = 0usize;
        loop {
            tokio::select! {
                _ = &mut stop_rx => {
                    tracing::debug!(execution_id = %id, step = index, "runner cancelled");
                    return;
                }
                _ = interval.tick() => {
                    if index < self.script.len() {
                        if self.tick(id, index).await {
                            index += 1;
                        }
                    } else {
                        self.finalize(id).await;
                        return;
                    }
                }
            }
        }
    }

    /// One update tick. Returns false when the persist failed, in which
    /// case the index must not advance (the step is retried next tick).
    async fn tick(&self, id: Uuid, index: usize) -> bool {
        let step = self.script.steps[index].clone();
        let metrics = self.script.metrics_at(index);

        if let Err(err) = self
            .store
            .update(id, ExecutionPatch::progress(step.clone(), metrics))
            .await
        {
            tracing::warn!(execution_id = %id, step = index, error = %err,
                "persist failed, retrying step on next tick");
            return false;
        }

        self.hub.publish(ExecutionEvent::ExecutionUpdate {
            execution_id: id,
            step,
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            progress: self.script.progress_at(index),
            metrics,
        });
        true
    }

    /// Script exhausted: mark completed and emit the terminal event — but
    /// only if the stop handle is still ours to remove. A stop() that
    /// raced ahead already emitted `execution_stopped` and owns the
    /// terminal transition.
    async fn finalize(&self, id: Uuid) {
        if self.active.write().await.remove(&id).is_none() {
            return;
        }
        match self
            .store
            .update(id, ExecutionPatch::status(ExecutionStatus::Completed))
            .await
        {
            Ok(_) => {
                self.hub.publish(ExecutionEvent::ExecutionCompleted {
                    execution_id: id,
                    message: COMPLETION_MESSAGE.to_string(),
                });
                tracing::info!(execution_id = %id, "execution completed");
            }
            Err(err) => {
                tracing::warn!(execution_id = %id, error = %err, "failed to persist completion");
            }
        }
    }
}
