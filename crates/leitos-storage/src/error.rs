//! Storage error types for the document store abstraction layer.
//!
//! This module defines all error types that can occur during store operations.

use std::fmt;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested document was not found.
    #[error("Document not found: {collection}/{id}")]
    NotFound {
        /// The collection that was searched.
        collection: String,
        /// The ID of the document that was not found.
        id: String,
    },

    /// The document data is invalid.
    #[error("Invalid document: {message}")]
    InvalidDocument {
        /// Description of why the document is invalid.
        message: String,
    },

    /// An atomic batch failed; none of its writes were applied.
    #[error("Transaction error: {message}")]
    TransactionError {
        /// Description of the transaction error.
        message: String,
    },

    /// Failed to reach the storage backend.
    #[error("Connection error: {message}")]
    ConnectionError {
        /// Description of the connection error.
        message: String,
    },

    /// A live subscription failed or was closed.
    #[error("Subscription error on {collection}: {message}")]
    SubscriptionError {
        /// The subscribed collection.
        collection: String,
        /// Description of the failure.
        message: String,
    },

    /// An internal storage error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.into(),
        }
    }

    /// Creates a new `InvalidDocument` error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Creates a new `TransactionError` error.
    #[must_use]
    pub fn transaction_error(message: impl Into<String>) -> Self {
        Self::TransactionError {
            message: message.into(),
        }
    }

    /// Creates a new `ConnectionError` error.
    #[must_use]
    pub fn connection_error(message: impl Into<String>) -> Self {
        Self::ConnectionError {
            message: message.into(),
        }
    }

    /// Creates a new `SubscriptionError` error.
    #[must_use]
    pub fn subscription(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SubscriptionError {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Creates the error returned once a subscription's producer is gone.
    #[must_use]
    pub fn subscription_closed(collection: impl Into<String>) -> Self {
        Self::subscription(collection, "subscription closed")
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if the backend could not be reached.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::ConnectionError { .. })
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::InvalidDocument { .. } => ErrorCategory::Validation,
            Self::TransactionError { .. } => ErrorCategory::Transaction,
            Self::ConnectionError { .. } | Self::SubscriptionError { .. } => {
                ErrorCategory::Infrastructure
            }
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

impl From<leitos_core::CoreError> for StorageError {
    fn from(err: leitos_core::CoreError) -> Self {
        Self::invalid_document(err.to_string())
    }
}

/// Categories of storage errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Document not found.
    NotFound,
    /// Validation error.
    Validation,
    /// Batch-related error.
    Transaction,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Validation => write!(f, "validation"),
            Self::Transaction => write!(f, "transaction"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::not_found("leitos", "b1");
        assert_eq!(err.to_string(), "Document not found: leitos/b1");

        let err = StorageError::subscription_closed("leitos");
        assert_eq!(
            err.to_string(),
            "Subscription error on leitos: subscription closed"
        );
    }

    #[test]
    fn test_error_predicates() {
        let err = StorageError::not_found("leitos", "b1");
        assert!(err.is_not_found());
        assert!(!err.is_connection_error());

        let err = StorageError::connection_error("offline");
        assert!(err.is_connection_error());
    }

    #[test]
    fn test_error_category() {
        assert_eq!(
            StorageError::not_found("leitos", "b1").category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            StorageError::transaction_error("aborted").category(),
            ErrorCategory::Transaction
        );
        assert_eq!(
            StorageError::connection_error("offline").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(
            StorageError::invalid_document("bad data").category(),
            ErrorCategory::Validation
        );
    }
}
