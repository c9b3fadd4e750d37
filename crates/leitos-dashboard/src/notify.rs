//! User-facing outcome notifications (toasts).
//!
//! The engine and the cache report outcomes through a [`Notifier`]; how they
//! are presented is up to whoever consumes them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(title: impl Into<String>, description: impl Into<String>, severity: Severity) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }

    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Success)
    }

    pub fn warning(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Warning)
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(title, description, Severity::Error)
    }
}

/// Delivers notifications. Delivery never fails the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Fans notifications out to every subscribed view.
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<Notification>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new(64)
    }
}

#[async_trait]
impl Notifier for BroadcastNotifier {
    async fn notify(&self, notification: Notification) {
        // No subscribers is not an error
        let _ = self.sender.send(notification);
    }
}

/// Writes notifications to the tracing output.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Error => tracing::error!(title = %n.title, "{}", n.description),
            Severity::Warning => tracing::warn!(title = %n.title, "{}", n.description),
            Severity::Info | Severity::Success => {
                tracing::info!(title = %n.title, "{}", n.description)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_notifier_delivers_to_subscribers() {
        let notifier = BroadcastNotifier::default();
        let mut rx = notifier.subscribe();

        notifier
            .notify(Notification::success("Leito bloqueado", "L-101"))
            .await;

        let received = rx.recv().await.unwrap();
        assert_eq!(received.severity, Severity::Success);
        assert_eq!(received.description, "L-101");
    }

    #[tokio::test]
    async fn test_broadcast_without_subscribers_is_silent() {
        let notifier = BroadcastNotifier::default();
        notifier.notify(Notification::error("x", "y")).await;
    }
}
