//! Store and transaction abstractions
//!
//! This module defines the seam between the membership engine and the
//! persistence layer: a [`Store`] that opens transactions and answers
//! snapshot reads, and a [`Transaction`] carrying every row operation a
//! mutating service needs.
//!
//! Transactions serialize against each other at the granularity declared by
//! their [`LockScope`]: mutations of one organization queue behind each
//! other while unrelated organizations proceed independently, the same way
//! a relational backend would take `SELECT ... FOR UPDATE` on the
//! organization's membership rows.

use async_trait::async_trait;
use uuid::Uuid;

use atrium_org::{Membership, Organization, OrgRole};

use crate::error::StoreResult;

/// A single lock an opening transaction must hold.
///
/// Keys order deterministically (organizations before users, then by id)
/// so multi-key scopes always acquire in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LockKey {
    /// Serializes mutations of one organization's membership set
    Organization(Uuid),

    /// Serializes mutations of one user's membership set
    User(Uuid),
}

/// The set of locks a transaction holds for its whole lifetime.
///
/// Declared up front at [`Store::begin`]; there is no lock escalation
/// mid-transaction, which keeps the acquisition order total and the model
/// deadlock-free.
#[derive(Debug, Clone)]
pub struct LockScope {
    keys: Vec<LockKey>,
}

impl LockScope {
    fn from_keys(mut keys: Vec<LockKey>) -> Self {
        keys.sort();
        keys.dedup();
        Self { keys }
    }

    /// Scope for mutations of one organization's membership set.
    pub fn organization(org_id: Uuid) -> Self {
        Self::from_keys(vec![LockKey::Organization(org_id)])
    }

    /// Scope for mutations of one user's membership set.
    pub fn user(user_id: Uuid) -> Self {
        Self::from_keys(vec![LockKey::User(user_id)])
    }

    /// Scope for mutations touching both a user's and an organization's
    /// membership rows, e.g. switching the active organization.
    pub fn user_and_organization(user_id: Uuid, org_id: Uuid) -> Self {
        Self::from_keys(vec![LockKey::User(user_id), LockKey::Organization(org_id)])
    }

    /// The locks in canonical acquisition order.
    pub fn keys(&self) -> &[LockKey] {
        &self.keys
    }
}

/// Partial update of a membership row.
///
/// Unset fields are left untouched. Built with the `set_*` constructors so
/// call sites read as the single column write they perform.
#[derive(Debug, Clone, Default)]
pub struct MembershipPatch {
    /// New role, if changing
    pub role: Option<OrgRole>,

    /// New active flag, if changing
    pub is_active: Option<bool>,

    /// New ticket-deletion flag, if changing
    pub can_delete_tickets: Option<bool>,
}

impl MembershipPatch {
    /// Patch that changes the role.
    pub fn set_role(role: OrgRole) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    /// Patch that changes the active flag.
    pub fn set_active(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Self::default()
        }
    }

    /// Patch that changes the ticket-deletion flag.
    pub fn set_can_delete_tickets(allowed: bool) -> Self {
        Self {
            can_delete_tickets: Some(allowed),
            ..Self::default()
        }
    }

    /// Apply this patch to a membership row.
    pub fn apply(&self, membership: &mut Membership) {
        if let Some(role) = self.role {
            membership.role = role;
        }
        if let Some(is_active) = self.is_active {
            membership.is_active = is_active;
        }
        if let Some(allowed) = self.can_delete_tickets {
            membership.can_delete_tickets = allowed;
        }
    }
}

/// One open transaction against the store.
///
/// All reads observe the transaction's own buffered writes. Nothing is
/// visible to other transactions until [`Transaction::commit`]; dropping a
/// transaction without committing rolls back every buffered write, so an
/// abandoned request never leaves a partial mutation behind.
#[async_trait]
pub trait Transaction: Send {
    /// Load one membership row.
    async fn membership(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<Membership>;

    /// Load the full membership snapshot of an organization.
    async fn memberships_by_organization(&self, org_id: Uuid) -> StoreResult<Vec<Membership>>;

    /// Load all memberships of a user across organizations.
    async fn memberships_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>>;

    /// Insert a membership row.
    async fn insert_membership(&mut self, membership: Membership) -> StoreResult<()>;

    /// Patch a membership row.
    async fn update_membership(
        &mut self,
        org_id: Uuid,
        user_id: Uuid,
        patch: MembershipPatch,
    ) -> StoreResult<()>;

    /// Delete a membership row.
    async fn delete_membership(&mut self, org_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    /// Load one organization row.
    async fn organization(&self, org_id: Uuid) -> StoreResult<Organization>;

    /// Insert an organization row.
    async fn insert_organization(&mut self, organization: Organization) -> StoreResult<()>;

    /// Delete an organization row and cascade-delete its memberships.
    async fn delete_organization(&mut self, org_id: Uuid) -> StoreResult<()>;

    /// Commit every buffered write atomically.
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Transactional membership store.
///
/// `begin` opens a transaction holding the locks of the given scope; the
/// non-transactional readers answer point-in-time snapshot queries for
/// read-only surfaces (listings, switchers) without taking any lock.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a transaction holding the locks of `scope`.
    ///
    /// Returns [`crate::StoreError::Conflict`] if a lock cannot be
    /// acquired before the store's lock timeout elapses.
    async fn begin(&self, scope: LockScope) -> StoreResult<Box<dyn Transaction>>;

    /// Snapshot read of one membership row.
    async fn membership(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<Membership>;

    /// Snapshot read of an organization's membership set.
    async fn memberships_by_organization(&self, org_id: Uuid) -> StoreResult<Vec<Membership>>;

    /// Snapshot read of a user's memberships across organizations.
    async fn memberships_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>>;

    /// Snapshot read of one organization row.
    async fn organization(&self, org_id: Uuid) -> StoreResult<Organization>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_scope_orders_and_dedups_keys() {
        let user = Uuid::now_v7();
        let org = Uuid::now_v7();

        let scope = LockScope::user_and_organization(user, org);
        assert_eq!(
            scope.keys(),
            &[LockKey::Organization(org), LockKey::User(user)]
        );

        let same = LockScope::from_keys(vec![
            LockKey::User(user),
            LockKey::User(user),
            LockKey::Organization(org),
        ]);
        assert_eq!(same.keys(), scope.keys());
    }

    #[test]
    fn test_membership_patch_applies_only_set_fields() {
        let mut membership = Membership::new(Uuid::now_v7(), Uuid::now_v7(), OrgRole::Member);

        MembershipPatch::set_role(OrgRole::Admin).apply(&mut membership);
        assert_eq!(membership.role, OrgRole::Admin);
        assert!(!membership.is_active);

        MembershipPatch::set_active(true).apply(&mut membership);
        assert!(membership.is_active);
        assert_eq!(membership.role, OrgRole::Admin);

        MembershipPatch::set_can_delete_tickets(true).apply(&mut membership);
        assert!(membership.can_delete_tickets);
    }
}
