//! Progress event channel.
//!
//! Workers publish [`ConversionProgress`] records; any number of subscribers
//! receive them. Each subscriber owns an unbounded queue, so a slow reader
//! delays only itself and never misses a transition. A subscriber is dropped
//! from the fan-out once its receiver is gone.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::debug;

use crate::orchestrator::ConversionProgress;

/// Receiving end handed to each subscriber.
pub type ProgressReceiver = mpsc::UnboundedReceiver<ConversionProgress>;

/// Fan-out of progress events to every live subscriber.
#[derive(Debug, Clone, Default)]
pub struct ProgressBroadcaster {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<ConversionProgress>>>>,
}

impl ProgressBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to all current subscribers, in publish order.
    pub fn publish(&self, event: ConversionProgress) {
        let mut subscribers = self.lock();
        let before = subscribers.len();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        if subscribers.len() < before {
            debug!(
                dropped = before - subscribers.len(),
                "Removed closed progress subscribers"
            );
        }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> ProgressReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().push(tx);
        rx
    }

    /// Number of subscribers whose receiver is still alive.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    // Publishing never panics while holding the lock, so a poisoned list is
    // still consistent.
    fn lock(&self) -> MutexGuard<'_, Vec<mpsc::UnboundedSender<ConversionProgress>>> {
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
