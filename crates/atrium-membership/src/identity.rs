//! Identity provider seam
//!
//! The engine never reads ambient session state. Callers resolve the
//! acting user through an [`IdentityProvider`] and pass the resulting id
//! into every service call explicitly.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::error::MembershipError;

/// No authenticated user is available.
#[derive(Debug, Error)]
#[error("Unauthenticated")]
pub struct Unauthenticated;

impl From<Unauthenticated> for MembershipError {
    fn from(_: Unauthenticated) -> Self {
        MembershipError::Unauthorized("no authenticated user".to_string())
    }
}

/// Source of the acting user's identity.
///
/// Supplied by the external auth subsystem; the engine treats it as an
/// opaque dependency injected per call site.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the current user's id.
    async fn current_user(&self) -> Result<Uuid, Unauthenticated>;
}

/// Identity provider pinned to one user.
///
/// Used by tests and single-user tooling.
#[derive(Debug, Clone)]
pub struct FixedIdentity {
    user_id: Uuid,
}

impl FixedIdentity {
    /// Create a provider that always resolves to `user_id`.
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

#[async_trait]
impl IdentityProvider for FixedIdentity {
    async fn current_user(&self) -> Result<Uuid, Unauthenticated> {
        Ok(self.user_id)
    }
}

/// Identity provider for unauthenticated contexts; always fails.
#[derive(Debug, Clone, Default)]
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    async fn current_user(&self) -> Result<Uuid, Unauthenticated> {
        Err(Unauthenticated)
    }
}
