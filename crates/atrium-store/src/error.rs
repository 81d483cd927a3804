//! Error types for store operations

use thiserror::Error;

/// Store error types.
///
/// These cover row-level failures and transactional failures. `Conflict`
/// is the only variant that indicates a transient condition; callers may
/// retry the whole transaction when they see it.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced row does not exist
    #[error("Row not found: {0}")]
    NotFound(String),

    /// Unique key already present
    #[error("Row already exists: {0}")]
    AlreadyExists(String),

    /// Transaction could not serialize against a concurrent writer
    #[error("Transaction conflict: {0}")]
    Conflict(String),

    /// Internal store error
    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Check if this error is transient and the transaction can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(StoreError::Conflict("lock timeout".into()).is_retryable());
        assert!(!StoreError::NotFound("membership".into()).is_retryable());
        assert!(!StoreError::AlreadyExists("membership".into()).is_retryable());
        assert!(!StoreError::Internal("oops".into()).is_retryable());
    }
}
