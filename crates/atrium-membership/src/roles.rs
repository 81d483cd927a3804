//! Role mutation service
//!
//! Changes a member's role or per-member permissions inside one
//! transaction. The organization's membership snapshot is read under the
//! organization lock, so the last-admin check can never race a concurrent
//! demotion or removal.

use std::sync::Arc;
use uuid::Uuid;

use atrium_org::{invariants, OrgRole};
use atrium_store::{LockScope, MembershipPatch, Store, StoreError, Transaction};

use crate::error::{MembershipError, MembershipResult};
use crate::events::MembershipEvent;

/// Service mutating member roles and permissions.
pub struct RoleService {
    store: Arc<dyn Store>,
}

impl RoleService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Change a member's role.
    ///
    /// Requires the actor to be an admin of the organization. Demoting the
    /// last admin is rejected. Setting a role to its current value is a
    /// no-op success and yields no event.
    ///
    /// Returns the event to dispatch after commit, or `None` for a no-op.
    pub async fn update_role(
        &self,
        org_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
        new_role: OrgRole,
    ) -> MembershipResult<Option<MembershipEvent>> {
        let mut tx = self.store.begin(LockScope::organization(org_id)).await?;

        require_admin(tx.as_ref(), org_id, actor_id).await?;

        let snapshot = tx.memberships_by_organization(org_id).await?;
        let target = snapshot
            .iter()
            .find(|m| m.user_id == target_id)
            .ok_or_else(|| {
                MembershipError::NotFound(format!("membership {}/{}", org_id, target_id))
            })?;

        if target.role == new_role {
            // Idempotent: nothing to write, nothing to announce
            return Ok(None);
        }

        if !new_role.is_admin() && invariants::is_last_admin(&snapshot, target_id) {
            return Err(MembershipError::InvariantViolation(
                "cannot demote the last admin".to_string(),
            ));
        }

        let old_role = target.role;
        tx.update_membership(org_id, target_id, MembershipPatch::set_role(new_role))
            .await?;
        tx.commit().await?;

        tracing::info!(
            %org_id,
            %target_id,
            old_role = old_role.as_str(),
            new_role = new_role.as_str(),
            "Member role updated"
        );

        Ok(Some(MembershipEvent::RoleChanged {
            organization_id: org_id,
            user_id: target_id,
            old_role,
            new_role,
            changed_by: actor_id,
        }))
    }

    /// Toggle a member's ticket-deletion permission.
    ///
    /// Requires the actor to be an admin of the organization. Idempotent:
    /// setting the flag to its current value is a no-op success.
    pub async fn set_can_delete_tickets(
        &self,
        org_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
        allowed: bool,
    ) -> MembershipResult<Option<MembershipEvent>> {
        let mut tx = self.store.begin(LockScope::organization(org_id)).await?;

        require_admin(tx.as_ref(), org_id, actor_id).await?;

        let target = tx.membership(org_id, target_id).await?;
        if target.can_delete_tickets == allowed {
            return Ok(None);
        }

        tx.update_membership(
            org_id,
            target_id,
            MembershipPatch::set_can_delete_tickets(allowed),
        )
        .await?;
        tx.commit().await?;

        tracing::info!(%org_id, %target_id, allowed, "Ticket deletion permission updated");

        Ok(Some(MembershipEvent::TicketPermissionChanged {
            organization_id: org_id,
            user_id: target_id,
            can_delete_tickets: allowed,
            changed_by: actor_id,
        }))
    }
}

/// Load the actor's membership and require admin privileges.
///
/// A missing membership is an authorization failure, not a lookup failure:
/// outsiders learn nothing about who belongs to the organization.
pub(crate) async fn require_admin(
    tx: &dyn Transaction,
    org_id: Uuid,
    actor_id: Uuid,
) -> MembershipResult<()> {
    let actor = tx.membership(org_id, actor_id).await.map_err(|e| match e {
        StoreError::NotFound(_) => {
            MembershipError::Unauthorized("not a member of this organization".to_string())
        }
        other => other.into(),
    })?;

    if !actor.role.can_manage_members() {
        return Err(MembershipError::Unauthorized(
            "not an admin of this organization".to_string(),
        ));
    }

    Ok(())
}
