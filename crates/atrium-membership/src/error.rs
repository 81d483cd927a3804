//! Error types for membership operations
//!
//! This module defines the error taxonomy every membership operation can
//! surface. Authorization and invariant checks run inside the same
//! transaction as the write they guard, so any of these errors means the
//! transaction rolled back with no partial effect.

use thiserror::Error;

use atrium_store::StoreError;

/// Membership operation error types.
#[derive(Debug, Error)]
pub enum MembershipError {
    /// Actor lacks the role or ownership required for the operation
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Referenced organization or membership does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation would break a membership invariant
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Transaction aborted due to concurrent modification; safe to retry
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Underlying store failure
    #[error("Store error: {0}")]
    Store(String),
}

/// Result type for membership operations.
pub type MembershipResult<T> = Result<T, MembershipError>;

impl MembershipError {
    /// Check if the failed operation may be retried.
    ///
    /// Only `Conflict` is transient; every other class is a terminal
    /// rejection and retrying would just repeat it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MembershipError::Conflict(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            MembershipError::Unauthorized(_) => 403,
            MembershipError::NotFound(_) => 404,
            MembershipError::Conflict(_) => 409,
            MembershipError::InvariantViolation(_) => 422,
            MembershipError::Store(_) => 500,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            MembershipError::Unauthorized(_) => "UNAUTHORIZED",
            MembershipError::NotFound(_) => "NOT_FOUND",
            MembershipError::InvariantViolation(_) => "INVARIANT_VIOLATION",
            MembershipError::Conflict(_) => "CONFLICT",
            MembershipError::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<StoreError> for MembershipError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => MembershipError::NotFound(what),
            StoreError::AlreadyExists(what) => {
                MembershipError::InvariantViolation(format!("{} already exists", what))
            }
            StoreError::Conflict(why) => MembershipError::Conflict(why),
            StoreError::Internal(why) => MembershipError::Store(why),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_conflict_is_retryable() {
        assert!(MembershipError::Conflict("lock timeout".into()).is_retryable());
        assert!(!MembershipError::Unauthorized("not an admin".into()).is_retryable());
        assert!(!MembershipError::NotFound("membership".into()).is_retryable());
        assert!(!MembershipError::InvariantViolation("last admin".into()).is_retryable());
        assert!(!MembershipError::Store("io".into()).is_retryable());
    }

    #[test]
    fn test_store_error_mapping() {
        let err: MembershipError = StoreError::Conflict("lock".into()).into();
        assert!(matches!(err, MembershipError::Conflict(_)));

        let err: MembershipError = StoreError::NotFound("membership".into()).into();
        assert!(matches!(err, MembershipError::NotFound(_)));

        let err: MembershipError = StoreError::AlreadyExists("membership".into()).into();
        assert!(matches!(err, MembershipError::InvariantViolation(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(MembershipError::Unauthorized("x".into()).status_code(), 403);
        assert_eq!(MembershipError::NotFound("x".into()).status_code(), 404);
        assert_eq!(MembershipError::Conflict("x".into()).status_code(), 409);
        assert_eq!(
            MembershipError::InvariantViolation("x".into()).status_code(),
            422
        );
    }
}
