//! Fan-out event hub.
//!
//! One process-wide broadcast channel: every subscriber sees every
//! execution's events, with no per-execution filtering — filtering, if
//! wanted, is a client-side concern. Delivery is FIFO per publisher; a
//! slow or dropped subscriber never affects the publisher or its peers.

use tokio::sync::broadcast;

use crate::model::ExecutionEvent;

const DEFAULT_CAPACITY: usize = 256;

/// Clone-able handle to the broadcast channel shared by the runner and
/// every observer session.
#[derive(Clone)]
pub struct EventHub {
    tx: broadcast::Sender<ExecutionEvent>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a new observer session. Unsubscribe is dropping the
    /// receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<ExecutionEvent> {
        self.tx.subscribe()
    }

    /// Deliver an event to all current subscribers. Publishing with no
    /// subscribers is a no-op, not an error.
    pub fn publish(&self, event: ExecutionEvent) {
        let _ = self.tx.send(event);
    }

    /// Number of currently connected subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
