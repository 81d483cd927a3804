//! # Atrium Membership Store
//!
//! Transactional persistence seam for the Atrium membership engine.
//!
//! ## Overview
//!
//! The atrium-store crate provides:
//! - **Store / Transaction traits**: row CRUD over memberships and
//!   organizations, executed inside caller-owned transactions
//! - **Lock scopes**: organization- and user-granularity serialization of
//!   conflicting transactions, the equivalent of `SELECT ... FOR UPDATE`
//!   on the contended rows
//! - **Memory backend**: a tokio-based in-memory implementation with the
//!   same commit/rollback/locking semantics, for single-process use and
//!   tests
//!
//! ## Guarantees
//!
//! - A transaction's reads observe its own writes and nothing from
//!   concurrent uncommitted transactions.
//! - Commit applies all buffered writes atomically; dropping a
//!   transaction rolls everything back.
//! - Two transactions whose lock scopes overlap never run their
//!   read-check-write windows concurrently; lock waits are bounded and
//!   surface as retryable [`StoreError::Conflict`] failures.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use atrium_org::{Membership, Organization, OrgRole};
//! use atrium_store::{LockScope, MemoryStore, Store};
//!
//! # async fn example() -> Result<(), atrium_store::StoreError> {
//! let store = MemoryStore::new();
//! let org = Organization::new("Acme Corp");
//! let user = uuid::Uuid::now_v7();
//!
//! let mut tx = store.begin(LockScope::organization(org.id)).await?;
//! tx.insert_organization(org.clone()).await?;
//! tx.insert_membership(Membership::new(org.id, user, OrgRole::Admin)).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
#[cfg(feature = "memory")]
pub mod memory;
pub mod store;

// Re-export main types for convenience
pub use error::{StoreError, StoreResult};
#[cfg(feature = "memory")]
pub use memory::MemoryStore;
pub use store::{LockKey, LockScope, MembershipPatch, Store, Transaction};
