//! Error types for the transaction engine.

use entilink_model::ModelError;
use entilink_wire::WireError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while executing transactions.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The retrieve request addresses more entities than fit into one
    /// request line.
    #[error("request uri too long: {length} bytes exceed the limit of {limit}")]
    UriTooLong {
        /// Length of the rejected request line.
        length: usize,
        /// The server's limit.
        limit: usize,
    },

    /// Model error: sync ambiguity, id reassignment or a structured
    /// transaction failure.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// The response payload could not be decoded.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl EngineError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a uri-too-long error.
    #[must_use]
    pub fn uri_too_long(length: usize, limit: usize) -> Self {
        Self::UriTooLong { length, limit }
    }

    /// Returns true if this error can be retried as-is.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Transport { retryable, .. } => *retryable,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_errors() {
        assert!(EngineError::transport_retryable("connection lost").is_retryable());
        assert!(!EngineError::transport_fatal("bad certificate").is_retryable());
        assert!(!EngineError::uri_too_long(9000, 8000).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = EngineError::uri_too_long(9000, 8000);
        assert!(err.to_string().contains("9000"));
        assert!(err.to_string().contains("8000"));
    }
}
