//! # Atrium Membership Engine
//!
//! The organization membership consistency engine of the Atrium
//! ticket-tracking platform: the rules, operations, and transactional
//! protocol that keep membership state valid while multiple actors
//! concurrently promote, demote, remove, or switch memberships.
//!
//! ## Invariants
//!
//! After every committed operation, for every organization and user:
//!
//! 1. Every organization has at least one member.
//! 2. Every organization has at least one admin.
//! 3. Every user has at most one active organization.
//! 4. Only admins mutate other memberships within their organization.
//! 5. Anyone may leave, subject to 1 and 2.
//!
//! ## Architecture
//!
//! ```text
//! MembershipEngine (retry + post-commit events)
//!   ├─ RoleService ──────────┐
//!   ├─ RemovalService ───────┤ one transaction per operation,
//!   ├─ ActiveSwitchService ──┤ invariants checked on the snapshot
//!   └─ LifecycleService ─────┘ read under the scope lock
//!            │
//!        atrium-store (Store / Transaction, lock scopes)
//!            │
//!        atrium-org (entities, pure invariant checks)
//! ```
//!
//! Every mutating operation opens one transaction, reads the affected
//! membership snapshot under the organization (or user) lock, evaluates
//! the invariants, and either commits the write or aborts with a domain
//! error. No check is ever made against state from outside the current
//! transaction.
//!
//! Conflicts (lock timeouts, serialization failures) are the only
//! retryable errors and are retried with bounded exponential backoff.
//! Post-commit events go to an [`EventSink`] for notification fan-out;
//! nothing external runs inside a transaction.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use atrium_membership::{FixedIdentity, IdentityProvider, MembershipEngine};
//! use atrium_org::OrgRole;
//! use atrium_store::MemoryStore;
//! use uuid::Uuid;
//!
//! # async fn example() -> Result<(), atrium_membership::MembershipError> {
//! let engine = MembershipEngine::new(Arc::new(MemoryStore::new()));
//!
//! // The acting user comes from the identity provider, never from
//! // ambient state.
//! let identity = FixedIdentity::new(Uuid::now_v7());
//! let actor = identity.current_user().await?;
//!
//! let org = engine.create_organization(actor, "Acme Corp").await?;
//! engine.switch_active(actor, org.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod active;
pub mod engine;
pub mod error;
pub mod events;
pub mod identity;
pub mod lifecycle;
pub mod removal;
pub mod retry;
pub mod roles;

// Re-export main types for convenience
pub use engine::{MembershipEngine, Outcome};
pub use error::{MembershipError, MembershipResult};
pub use events::{EventSink, MembershipEvent, MemorySink, NullSink};
pub use identity::{AnonymousIdentity, FixedIdentity, IdentityProvider, Unauthenticated};
pub use retry::RetryConfig;
