//! Organization lifecycle service
//!
//! Creates and deletes organizations, and manages member admission. An
//! organization is born with its creator as sole admin in the same
//! transaction, so no committed state ever shows an organization without
//! an admin. Deletion is the only way to dissolve an organization and is
//! refused while any member has it as their active organization.

use std::sync::Arc;
use uuid::Uuid;

use atrium_org::{Membership, Organization, OrganizationSummary, OrgRole};
use atrium_store::{LockScope, Store, StoreError};

use crate::error::{MembershipError, MembershipResult};
use crate::events::MembershipEvent;
use crate::roles::require_admin;

/// Service managing organization creation, deletion, and admission.
pub struct LifecycleService {
    store: Arc<dyn Store>,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Create an organization with the actor as its founding admin.
    ///
    /// The organization row and the admin membership commit together. The
    /// membership starts inactive; making the new organization the actor's
    /// active one is a separate, explicit switch.
    pub async fn create_organization(
        &self,
        actor_id: Uuid,
        name: impl Into<String>,
    ) -> MembershipResult<(Organization, MembershipEvent)> {
        let organization = Organization::new(name);
        let mut tx = self
            .store
            .begin(LockScope::organization(organization.id))
            .await?;

        tx.insert_organization(organization.clone()).await?;
        tx.insert_membership(Membership::new(organization.id, actor_id, OrgRole::Admin))
            .await?;
        tx.commit().await?;

        tracing::info!(
            org_id = %organization.id,
            %actor_id,
            name = %organization.name,
            "Organization created"
        );

        let event = MembershipEvent::OrganizationCreated {
            organization_id: organization.id,
            name: organization.name.clone(),
            created_by: actor_id,
        };
        Ok((organization, event))
    }

    /// Delete an organization and cascade-delete its memberships.
    ///
    /// Requires the actor to be an admin. Refused while the organization
    /// is any member's active organization: deleting the default context
    /// out from under a user forces every surface they touch to handle a
    /// dangling reference mid-session.
    pub async fn delete_organization(
        &self,
        org_id: Uuid,
        actor_id: Uuid,
    ) -> MembershipResult<MembershipEvent> {
        let mut tx = self.store.begin(LockScope::organization(org_id)).await?;

        tx.organization(org_id).await?;
        require_admin(tx.as_ref(), org_id, actor_id).await?;

        let snapshot = tx.memberships_by_organization(org_id).await?;
        if snapshot.iter().any(|m| m.is_active) {
            return Err(MembershipError::InvariantViolation(
                "cannot delete an active organization".to_string(),
            ));
        }

        tx.delete_organization(org_id).await?;
        tx.commit().await?;

        tracing::info!(%org_id, %actor_id, "Organization deleted");

        Ok(MembershipEvent::OrganizationDeleted {
            organization_id: org_id,
            deleted_by: actor_id,
        })
    }

    /// Add a user to an organization.
    ///
    /// Requires the actor to be an admin. The new membership starts
    /// inactive regardless of role.
    pub async fn add_member(
        &self,
        org_id: Uuid,
        actor_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> MembershipResult<MembershipEvent> {
        let mut tx = self.store.begin(LockScope::organization(org_id)).await?;

        tx.organization(org_id).await?;
        require_admin(tx.as_ref(), org_id, actor_id).await?;

        match tx.membership(org_id, user_id).await {
            Ok(_) => {
                return Err(MembershipError::InvariantViolation(
                    "already a member of this organization".to_string(),
                ));
            }
            Err(StoreError::NotFound(_)) => {}
            Err(other) => return Err(other.into()),
        }

        tx.insert_membership(Membership::new(org_id, user_id, role).with_inviter(actor_id))
            .await?;
        tx.commit().await?;

        tracing::info!(%org_id, %user_id, %actor_id, role = role.as_str(), "Member added");

        Ok(MembershipEvent::MemberAdded {
            organization_id: org_id,
            user_id,
            role,
            invited_by: actor_id,
        })
    }

    /// List the organizations a user belongs to, for the org switcher.
    ///
    /// Snapshot read outside any transaction; rows whose organization was
    /// deleted between reads are skipped rather than surfaced as errors.
    pub async fn organizations_for_user(
        &self,
        user_id: Uuid,
    ) -> MembershipResult<Vec<OrganizationSummary>> {
        let memberships = self.store.memberships_by_user(user_id).await?;

        let mut summaries = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let organization = match self.store.organization(membership.organization_id).await {
                Ok(org) => org,
                Err(StoreError::NotFound(_)) => continue,
                Err(other) => return Err(other.into()),
            };
            let roster = self
                .store
                .memberships_by_organization(membership.organization_id)
                .await?;

            summaries.push(OrganizationSummary {
                id: organization.id,
                name: organization.name,
                user_role: membership.role,
                is_active: membership.is_active,
                member_count: roster.len() as u32,
                admin_count: roster.iter().filter(|m| m.is_admin()).count() as u32,
            });
        }

        Ok(summaries)
    }
}
