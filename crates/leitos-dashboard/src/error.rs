use leitos_core::{BedStatus, CoreError};
use leitos_storage::StorageError;
use thiserror::Error;

/// Caller input that fails a precondition. Raised before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("a reason is required to block a bed")]
    EmptyBlockReason,

    #[error("bed {bed_id} is occupied and cannot be blocked")]
    BedOccupied { bed_id: String },

    #[error("bed {bed_id} does not hold patient {patient_id}")]
    PatientNotInBed { bed_id: String, patient_id: String },

    #[error("destination bed {bed_id} is unavailable ({status})")]
    DestinationUnavailable { bed_id: String, status: BedStatus },

    #[error("bed {bed_id} is reserved for another patient")]
    ReservedForOther { bed_id: String },

    #[error("patient {patient_id} is not awaiting an ICU bed")]
    NotAwaitingIcu { patient_id: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: String },

    #[error("store error: {0}")]
    Store(#[from] StorageError),

    #[error("malformed document: {0}")]
    Decode(#[from] CoreError),
}

/// Coarse grouping used for logging and for choosing the notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Store,
    Data,
}

impl EngineError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Store(_) => ErrorCategory::Store,
            Self::Decode(_) => ErrorCategory::Data,
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        let err: EngineError = ValidationError::EmptyBlockReason.into();
        assert!(err.is_validation());
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.to_string(), "a reason is required to block a bed");

        let err: EngineError = StorageError::connection_error("offline").into();
        assert_eq!(err.category(), ErrorCategory::Store);

        let err = EngineError::not_found("patient", "p9");
        assert_eq!(err.to_string(), "patient p9 not found");
    }
}
