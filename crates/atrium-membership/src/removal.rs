//! Membership removal service
//!
//! Removes a membership, either as a self-leave or as an admin-initiated
//! removal. The guards run against the snapshot read in the same
//! transaction as the delete, under the organization lock:
//!
//! - the last member cannot be removed (the organization must be deleted
//!   outright, never emptied)
//! - the last admin cannot be removed
//!
//! Removal never touches the user's `is_active` flag on other
//! organizations. If the removed membership was the user's active one,
//! the user is left with zero active organizations until they explicitly
//! switch to another.

use std::sync::Arc;
use uuid::Uuid;

use atrium_org::invariants;
use atrium_store::{LockScope, Store};

use crate::error::{MembershipError, MembershipResult};
use crate::events::MembershipEvent;
use crate::roles::require_admin;

/// Service removing memberships.
pub struct RemovalService {
    store: Arc<dyn Store>,
}

impl RemovalService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Remove a member from an organization.
    ///
    /// `actor_id == target_id` is a self-leave and needs no privileges; any
    /// other removal requires the actor to be an admin of the organization.
    pub async fn remove_member(
        &self,
        org_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> MembershipResult<MembershipEvent> {
        let leaving = actor_id == target_id;
        let mut tx = self.store.begin(LockScope::organization(org_id)).await?;

        if !leaving {
            require_admin(tx.as_ref(), org_id, actor_id).await?;
        }

        let snapshot = tx.memberships_by_organization(org_id).await?;
        if !snapshot.iter().any(|m| m.user_id == target_id) {
            return Err(MembershipError::NotFound(format!(
                "membership {}/{}",
                org_id, target_id
            )));
        }

        if invariants::is_last_member(&snapshot) {
            return Err(MembershipError::InvariantViolation(
                "cannot remove the last member; delete the organization instead".to_string(),
            ));
        }

        if invariants::is_last_admin(&snapshot, target_id) {
            return Err(MembershipError::InvariantViolation(
                "cannot remove the last admin".to_string(),
            ));
        }

        tx.delete_membership(org_id, target_id).await?;
        tx.commit().await?;

        tracing::info!(%org_id, %target_id, %actor_id, leaving, "Member removed");

        Ok(MembershipEvent::MemberRemoved {
            organization_id: org_id,
            user_id: target_id,
            removed_by: actor_id,
            left: leaving,
        })
    }
}
