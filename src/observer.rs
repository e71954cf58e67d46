//! Observer-side reconciliation of the event stream.
//!
//! An observer session keeps a bounded, newest-first activity log plus the
//! metrics snapshot from the most recent update (last write wins, never
//! merged). Entry classification is a substring match on the free-text
//! step message — brittle by design, mirroring what the console renders.

use std::collections::VecDeque;

use chrono::Local;
use uuid::Uuid;

use crate::model::{ExecutionEvent, ExecutionMetrics};

/// How an activity entry is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    Success,
    Warning,
    Info,
}

/// Classify a step message by keyword.
pub fn classify(message: &str) -> ActivityKind {
    if message.contains("completed") || message.contains("finished") {
        ActivityKind::Success
    } else if message.contains("Warning") || message.contains("delay") {
        ActivityKind::Warning
    } else {
        ActivityKind::Info
    }
}

/// One line of the activity log.
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub id: u64,
    pub timestamp: String,
    pub message: String,
    pub kind: ActivityKind,
}

/// Bounded view over the event stream, as a client session renders it.
///
/// Callers choose the capacity: the live metrics panel keeps 10 entries,
/// the full output log keeps 1000.
pub struct ObserverView {
    capacity: usize,
    next_id: u64,
    entries: VecDeque<ActivityEntry>,
    pub metrics: ExecutionMetrics,
    pub executing: bool,
    pub current_execution: Option<Uuid>,
}

impl ObserverView {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            next_id: 0,
            entries: VecDeque::new(),
            metrics: ExecutionMetrics::default(),
            executing: false,
            current_execution: None,
        }
    }

    /// Newest-first entries, never more than the configured capacity.
    pub fn entries(&self) -> impl Iterator<Item = &ActivityEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mark a new execution as the one this session is driving, as the
    /// start request's success handler does.
    pub fn begin(&mut self, execution_id: Uuid) {
        self.executing = true;
        self.current_execution = Some(execution_id);
    }

    /// Fold one received event into the view.
    pub fn apply(&mut self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::ExecutionUpdate {
                step,
                timestamp,
                metrics,
                ..
            } => {
                self.push(timestamp.clone(), step.clone(), classify(step));
                self.metrics = *metrics;
            }
            ExecutionEvent::ExecutionCompleted { message, .. } => {
                self.push(now_timestamp(), message.clone(), ActivityKind::Success);
                self.executing = false;
                self.current_execution = None;
            }
            ExecutionEvent::ExecutionStopped { message, .. } => {
                self.push(now_timestamp(), message.clone(), classify(message));
                self.executing = false;
                self.current_execution = None;
            }
        }
    }

    fn push(&mut self, timestamp: String, message: String, kind: ActivityKind) {
        let entry = ActivityEntry {
            id: self.next_id,
            timestamp,
            message,
            kind,
        };
        self.next_id += 1;
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }
}

fn now_timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(step: &str, tokens: u64) -> ExecutionEvent {
        ExecutionEvent::ExecutionUpdate {
            execution_id: Uuid::nil(),
            step: step.to_string(),
            timestamp: "10:00:00".to_string(),
            progress: 50,
            metrics: ExecutionMetrics {
                tokens_used: tokens,
                ..Default::default()
            },
        }
    }

    #[test]
    fn classification_matches_on_keywords() {
        assert_eq!(classify("Execution completed successfully!"), ActivityKind::Success);
        assert_eq!(classify("All tasks finished"), ActivityKind::Success);
        assert_eq!(classify("Warning: rate limit approaching"), ActivityKind::Warning);
        assert_eq!(classify("Expecting a delay in responses"), ActivityKind::Warning);
        assert_eq!(classify("Market Analyst: Beginning analysis..."), ActivityKind::Info);
        // Case-sensitive on purpose: lowercase "warning" is not matched.
        assert_eq!(classify("warning in lowercase"), ActivityKind::Info);
    }

    #[test]
    fn log_is_bounded_with_fifo_eviction_newest_first() {
        let cap = 10;
        let mut view = ObserverView::new(cap);
        for i in 0..cap + 5 {
            view.apply(&update(&format!("step {i}"), i as u64));
        }
        assert_eq!(view.len(), cap);
        // Newest first: the head is the last event applied.
        let messages: Vec<_> = view.entries().map(|e| e.message.clone()).collect();
        assert_eq!(messages[0], "step 14");
        assert_eq!(messages[cap - 1], "step 5");
    }

    #[test]
    fn metrics_snapshot_is_last_write_wins() {
        let mut view = ObserverView::new(10);
        view.apply(&update("first", 100));
        view.apply(&update("second", 50));
        assert_eq!(view.metrics.tokens_used, 50);
    }

    #[test]
    fn terminal_events_clear_the_execution_handle() {
        let mut view = ObserverView::new(10);
        let id = Uuid::new_v4();
        view.begin(id);
        assert!(view.executing);

        view.apply(&ExecutionEvent::ExecutionCompleted {
            execution_id: id,
            message: "Execution completed successfully!".to_string(),
        });
        assert!(!view.executing);
        assert!(view.current_execution.is_none());
        assert_eq!(view.entries().next().unwrap().kind, ActivityKind::Success);
    }

    #[test]
    fn stopped_event_appends_one_info_entry() {
        let mut view = ObserverView::new(10);
        view.begin(Uuid::nil());
        view.apply(&ExecutionEvent::ExecutionStopped {
            execution_id: Uuid::nil(),
            message: "Execution stopped by user".to_string(),
        });
        assert_eq!(view.len(), 1);
        assert_eq!(view.entries().next().unwrap().kind, ActivityKind::Info);
        assert!(!view.executing);
    }
}
