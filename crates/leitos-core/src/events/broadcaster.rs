//! Change broadcaster for document events.
//!
//! The `ChangeBroadcaster` is the bus a store backend publishes committed
//! changes on. It uses tokio's broadcast channel, so any number of live
//! subscriptions can follow the same store.

use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::DocumentEvent;

/// Default buffer size for the broadcast channel.
/// Slow receivers past this limit observe `Lagged` and must resynchronise.
const DEFAULT_BUFFER_SIZE: usize = 1024;

#[derive(Clone)]
pub struct ChangeBroadcaster {
    sender: broadcast::Sender<DocumentEvent>,
}

impl ChangeBroadcaster {
    /// Create a new broadcaster with default buffer size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new broadcaster with custom buffer size.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Create a new broadcaster wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Send an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event.
    pub fn send(&self, event: DocumentEvent) -> usize {
        self.sender.send(event).unwrap_or_default()
    }

    /// Subscribe to events broadcast after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DocumentEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Default for ChangeBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeBroadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBroadcaster")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
