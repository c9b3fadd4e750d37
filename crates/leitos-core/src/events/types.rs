//! Document change event types.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Type of document change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentEventType {
    /// Document was created
    Created,
    /// Document was updated
    Updated,
    /// Document was deleted
    Deleted,
}

impl DocumentEventType {
    /// Returns the string representation of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentEventType::Created => "created",
            DocumentEventType::Updated => "updated",
            DocumentEventType::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for DocumentEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event representing a committed change to one document.
///
/// Events carry no document body; subscribers re-read the collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEvent {
    pub event_type: DocumentEventType,
    pub collection: String,
    pub document_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

impl DocumentEvent {
    pub fn new(
        event_type: DocumentEventType,
        collection: impl Into<String>,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            collection: collection.into(),
            document_id: document_id.into(),
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    pub fn created(collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self::new(DocumentEventType::Created, collection, document_id)
    }

    pub fn updated(collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self::new(DocumentEventType::Updated, collection, document_id)
    }

    pub fn deleted(collection: impl Into<String>, document_id: impl Into<String>) -> Self {
        Self::new(DocumentEventType::Deleted, collection, document_id)
    }

    pub fn affects(&self, collection: &str) -> bool {
        self.collection == collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_constructors() {
        let event = DocumentEvent::deleted("pacientes", "p1");
        assert_eq!(event.event_type, DocumentEventType::Deleted);
        assert_eq!(event.document_id, "p1");
        assert!(event.affects("pacientes"));
        assert!(!event.affects("leitos"));
    }

    #[test]
    fn test_event_type_display() {
        assert_eq!(DocumentEventType::Updated.to_string(), "updated");
    }
}
