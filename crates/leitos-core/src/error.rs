use thiserror::Error;

/// Core error types for bed-management data handling
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid document {collection}/{id}: {message}")]
    InvalidDocument {
        collection: String,
        id: String,
        message: String,
    },

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Time formatting error: {0}")]
    TimeError(#[from] time::error::Format),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl CoreError {
    /// Create a new InvalidDocument error
    pub fn invalid_document(
        collection: impl Into<String>,
        id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidDocument {
            collection: collection.into(),
            id: id.into(),
            message: message.into(),
        }
    }

    /// Create a new InvalidTimestamp error
    pub fn invalid_timestamp(value: impl Into<String>) -> Self {
        Self::InvalidTimestamp(value.into())
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidDocument { .. } | Self::InvalidTimestamp(_) => ErrorCategory::Validation,
            Self::JsonError(_) => ErrorCategory::Serialization,
            Self::TimeError(_) => ErrorCategory::System,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Serialization,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Serialization => write!(f, "serialization"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_document_error() {
        let err = CoreError::invalid_document("leitos", "L-101", "missing field `status`");
        assert_eq!(
            err.to_string(),
            "Invalid document leitos/L-101: missing field `status`"
        );
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: CoreError = json_err.into();
        assert_eq!(err.category(), ErrorCategory::Serialization);
    }

    #[test]
    fn test_category_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::System.to_string(), "system");
    }
}
