//! Error types for the entity model.

use crate::report::TransactionError;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur in model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    /// An entity's permanent id may not be reassigned.
    #[error("id already assigned: entity has id {existing}, refusing {requested}")]
    IdAlreadyAssigned {
        /// The id the entity already carries.
        existing: i64,
        /// The id the caller tried to assign.
        requested: i64,
    },

    /// A synchronization match was ambiguous under the uniqueness policy.
    #[error("ambiguous match: {candidates} remote entities match \"{name}\"")]
    AmbiguousMatch {
        /// Name (or path/id rendering) of the local entity.
        name: String,
        /// Number of remote candidates.
        candidates: usize,
    },

    /// A transaction failed; the structured error tree describes why.
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}

impl ModelError {
    /// Creates an id-already-assigned error.
    pub fn id_already_assigned(existing: i64, requested: i64) -> Self {
        Self::IdAlreadyAssigned {
            existing,
            requested,
        }
    }

    /// Creates an ambiguous-match error.
    pub fn ambiguous_match(name: impl Into<String>, candidates: usize) -> Self {
        Self::AmbiguousMatch {
            name: name.into(),
            candidates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ModelError::id_already_assigned(5, 7);
        assert!(err.to_string().contains('5'));
        assert!(err.to_string().contains('7'));

        let err = ModelError::ambiguous_match("X", 3);
        assert!(err.to_string().contains("3 remote entities"));
    }
}
