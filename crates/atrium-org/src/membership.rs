//! Membership domain model
//!
//! This module provides the membership entity that links users to
//! organizations. A membership carries the user's role, their per-member
//! ticket permissions, and whether the organization is the user's currently
//! active one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::OrgRole;

/// Membership linking a user to an organization.
///
/// A membership is identified by the `(user_id, organization_id)` pair.
/// It records the user's role, when they joined, who invited them, whether
/// they may delete tickets, and whether this organization is the one the
/// user currently works in (`is_active`).
///
/// At most one membership per user has `is_active` set; switching it is a
/// transactional operation owned by the consistency engine, never a plain
/// field write.
///
/// # Examples
///
/// ```
/// use uuid::Uuid;
/// use atrium_org::{Membership, OrgRole};
///
/// let org_id = Uuid::now_v7();
/// let user_id = Uuid::now_v7();
/// let membership = Membership::new(org_id, user_id, OrgRole::Member);
/// assert!(!membership.is_active);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    /// Organization ID
    pub organization_id: Uuid,

    /// User ID
    pub user_id: Uuid,

    /// Role within the organization
    pub role: OrgRole,

    /// Whether this is the user's currently active organization
    pub is_active: bool,

    /// Whether this member may delete tickets
    pub can_delete_tickets: bool,

    /// When the user joined
    pub joined_at: DateTime<Utc>,

    /// Who invited this user (if applicable)
    pub invited_by: Option<Uuid>,
}

impl Membership {
    /// Creates a new membership.
    ///
    /// The membership is created with:
    /// - Inactive status (activation is an explicit switch operation)
    /// - Ticket deletion disabled
    /// - Current timestamp for joined_at
    ///
    /// # Arguments
    ///
    /// * `organization_id` - The organization ID
    /// * `user_id` - The user ID
    /// * `role` - The user's role in the organization
    ///
    /// # Examples
    ///
    /// ```
    /// use uuid::Uuid;
    /// use atrium_org::{Membership, OrgRole};
    ///
    /// let org_id = Uuid::now_v7();
    /// let user_id = Uuid::now_v7();
    /// let membership = Membership::new(org_id, user_id, OrgRole::Admin);
    /// assert_eq!(membership.role, OrgRole::Admin);
    /// ```
    pub fn new(organization_id: Uuid, user_id: Uuid, role: OrgRole) -> Self {
        Self {
            organization_id,
            user_id,
            role,
            is_active: false,
            can_delete_tickets: false,
            joined_at: Utc::now(),
            invited_by: None,
        }
    }

    /// Set who invited this user.
    ///
    /// # Arguments
    ///
    /// * `inviter_id` - The user ID of who invited this user
    pub fn with_inviter(mut self, inviter_id: Uuid) -> Self {
        self.invited_by = Some(inviter_id);
        self
    }

    /// Allow this member to delete tickets.
    pub fn with_ticket_deletion(mut self) -> Self {
        self.can_delete_tickets = true;
        self
    }

    /// Check if this membership carries admin privileges.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_creation() {
        let org_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();
        let membership = Membership::new(org_id, user_id, OrgRole::Member);

        assert_eq!(membership.organization_id, org_id);
        assert_eq!(membership.user_id, user_id);
        assert_eq!(membership.role, OrgRole::Member);
        assert!(!membership.is_active);
        assert!(!membership.can_delete_tickets);
        assert!(membership.invited_by.is_none());
    }

    #[test]
    fn test_membership_with_inviter() {
        let org_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();
        let inviter_id = Uuid::now_v7();

        let membership = Membership::new(org_id, user_id, OrgRole::Member).with_inviter(inviter_id);

        assert_eq!(membership.invited_by, Some(inviter_id));
    }

    #[test]
    fn test_membership_with_ticket_deletion() {
        let org_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();

        let membership =
            Membership::new(org_id, user_id, OrgRole::Member).with_ticket_deletion();

        assert!(membership.can_delete_tickets);
    }

    #[test]
    fn test_membership_is_admin() {
        let org_id = Uuid::now_v7();
        let user_id = Uuid::now_v7();

        assert!(Membership::new(org_id, user_id, OrgRole::Admin).is_admin());
        assert!(!Membership::new(org_id, user_id, OrgRole::Member).is_admin());
    }
}
