//! Active-organization switch service
//!
//! Flips which single organization is active for a user. The clear-all and
//! set-one writes run in one transaction under the user's lock, so no
//! interleaving can observe two active rows, and an abort between the two
//! steps rolls both back.

use std::sync::Arc;
use uuid::Uuid;

use atrium_store::{LockScope, MembershipPatch, Store};

use crate::error::{MembershipError, MembershipResult};
use crate::events::MembershipEvent;

/// Service switching a user's active organization.
pub struct ActiveSwitchService {
    store: Arc<dyn Store>,
}

impl ActiveSwitchService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Make `target_org_id` the user's single active organization.
    ///
    /// Requires an existing membership in the target organization. Every
    /// other membership of the user is deactivated in the same commit.
    pub async fn switch_active(
        &self,
        user_id: Uuid,
        target_org_id: Uuid,
    ) -> MembershipResult<MembershipEvent> {
        // The scope covers the user's rows and the target organization, so
        // the switch serializes against deletion of that organization.
        let mut tx = self
            .store
            .begin(LockScope::user_and_organization(user_id, target_org_id))
            .await?;

        let memberships = tx.memberships_by_user(user_id).await?;
        let target = memberships
            .iter()
            .find(|m| m.organization_id == target_org_id)
            .ok_or_else(|| {
                MembershipError::NotFound(format!("membership {}/{}", target_org_id, user_id))
            })?;

        let previous = memberships
            .iter()
            .find(|m| m.is_active)
            .map(|m| m.organization_id);

        for membership in &memberships {
            if membership.is_active && membership.organization_id != target_org_id {
                tx.update_membership(
                    membership.organization_id,
                    user_id,
                    MembershipPatch::set_active(false),
                )
                .await?;
            }
        }
        if !target.is_active {
            tx.update_membership(target_org_id, user_id, MembershipPatch::set_active(true))
                .await?;
        }

        tx.commit().await?;

        tracing::info!(%user_id, %target_org_id, ?previous, "Active organization switched");

        Ok(MembershipEvent::ActiveOrganizationChanged {
            user_id,
            organization_id: target_org_id,
            previous,
        })
    }
}
