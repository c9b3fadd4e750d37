//! Live collection subscriptions as snapshot streams.
//!
//! A [`Subscription`] always holds the latest known state of its collection.
//! Backends publish a fresh [`Snapshot`] after every committed change that
//! touches the collection; consumers read the newest one and skip any
//! intermediate states they missed.
//!
//! Dropping the `Subscription` releases it. The backend notices the closed
//! channel and stops producing snapshots for it.

use std::sync::Arc;

use futures_util::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::error::StorageError;
use crate::types::Snapshot;

/// What a backend publishes into a subscription.
#[derive(Debug, Clone)]
pub enum SnapshotState {
    Ready(Arc<Snapshot>),
    /// The backend could not rebuild the snapshot.
    Failed { message: String },
}

/// Producer half held by the backend.
pub type SnapshotSender = watch::Sender<SnapshotState>;

#[derive(Debug)]
pub struct Subscription {
    collection: String,
    receiver: watch::Receiver<SnapshotState>,
}

impl Subscription {
    /// Creates a subscription and the sender a backend drives it with.
    #[must_use]
    pub fn channel(collection: impl Into<String>, initial: Snapshot) -> (SnapshotSender, Self) {
        let (sender, receiver) = watch::channel(SnapshotState::Ready(Arc::new(initial)));
        let subscription = Self {
            collection: collection.into(),
            receiver,
        };
        (sender, subscription)
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Returns the newest state without waiting.
    pub fn latest(&self) -> Result<Arc<Snapshot>, StorageError> {
        self.to_result(self.receiver.borrow().clone())
    }

    /// Waits for the next published state and returns it.
    ///
    /// Fails with a subscription error when the backend reported a failure
    /// or stopped producing snapshots.
    pub async fn changed(&mut self) -> Result<Arc<Snapshot>, StorageError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| StorageError::subscription_closed(&self.collection))?;
        let state = self.receiver.borrow_and_update().clone();
        self.to_result(state)
    }

    /// True once the backend stopped producing snapshots.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.receiver.has_changed().is_err()
    }

    /// Converts the subscription into a stream of states, starting with the current one.
    pub fn into_stream(self) -> impl Stream<Item = SnapshotState> {
        WatchStream::new(self.receiver)
    }

    fn to_result(&self, state: SnapshotState) -> Result<Arc<Snapshot>, StorageError> {
        match state {
            SnapshotState::Ready(snapshot) => Ok(snapshot),
            SnapshotState::Failed { message } => {
                Err(StorageError::subscription(&self.collection, message))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_latest_and_changed() {
        let (sender, mut subscription) =
            Subscription::channel("leitos", Snapshot::new("leitos", Vec::new()));
        assert!(subscription.latest().unwrap().is_empty());

        sender
            .send(SnapshotState::Failed {
                message: "offline".into(),
            })
            .unwrap();
        let err = subscription.changed().await.unwrap_err();
        assert!(err.to_string().contains("offline"));

        assert!(!subscription.is_closed());
        drop(sender);
        assert!(subscription.is_closed());
        let err = subscription.changed().await.unwrap_err();
        assert!(err.to_string().contains("subscription closed"));
    }

    #[tokio::test]
    async fn test_into_stream_yields_current_state() {
        let (_sender, subscription) =
            Subscription::channel("setores", Snapshot::new("setores", Vec::new()));
        let mut stream = Box::pin(subscription.into_stream());
        let first = stream.next().await.unwrap();
        assert!(matches!(first, SnapshotState::Ready(_)));
    }

    #[tokio::test]
    async fn test_drop_closes_sender() {
        let (sender, subscription) =
            Subscription::channel("leitos", Snapshot::new("leitos", Vec::new()));
        assert!(!sender.is_closed());
        drop(subscription);
        assert!(sender.is_closed());
    }
}
