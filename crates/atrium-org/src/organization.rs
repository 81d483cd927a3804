//! Organization domain model
//!
//! This module provides the core Organization entity. Organizations are the
//! top-level tenant entities that own tickets and members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::OrgRole;

/// An organization represents a tenant in the multi-tenant system.
///
/// Users can belong to multiple organizations with different roles. An
/// organization is created with exactly one membership (its creator, as
/// admin) and lives until explicitly deleted; it is never left without
/// members by a removal.
///
/// # Examples
///
/// ```
/// use atrium_org::Organization;
///
/// let org = Organization::new("Acme Corp");
/// assert_eq!(org.name, "Acme Corp");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier for the organization
    pub id: Uuid,

    /// Human-readable name
    pub name: String,

    /// When the organization was created
    pub created_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization.
    ///
    /// The organization is created with a newly generated UUID v7 ID and
    /// the current timestamp. The creator's admin membership is seeded by
    /// the lifecycle service in the same transaction, not here.
    ///
    /// # Arguments
    ///
    /// * `name` - The organization name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            created_at: Utc::now(),
        }
    }
}

/// Summary of an organization for list displays.
///
/// This is a lightweight representation of an organization for a user's
/// organization switcher, including aggregated counts and the user's own
/// role and active flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSummary {
    /// Organization ID
    pub id: Uuid,

    /// Organization name
    pub name: String,

    /// User's role in this organization
    pub user_role: OrgRole,

    /// Whether this is the user's active organization
    pub is_active: bool,

    /// Number of members
    pub member_count: u32,

    /// Number of admins
    pub admin_count: u32,
}
