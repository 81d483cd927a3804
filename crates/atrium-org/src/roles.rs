//! Organization roles
//!
//! This module defines the role a membership carries within an organization
//! and the management capabilities attached to it.

use serde::{Deserialize, Serialize};

/// User role within an organization.
///
/// Roles are ordered, with Admin above Member. Every organization must keep
/// at least one Admin at all times; the consistency engine enforces this on
/// every role change and removal.
///
/// # Permission Model
///
/// - **Member**: Works on tickets within the organization
/// - **Admin**: Additionally manages members, roles, and the organization itself
///
/// # Examples
///
/// ```
/// use atrium_org::OrgRole;
///
/// let role = OrgRole::Member;
/// assert!(!role.is_admin());
///
/// let admin = OrgRole::Admin;
/// assert!(admin.can_manage_members());
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrgRole {
    /// Regular organization member
    Member = 0,

    /// Manages members and the organization itself
    Admin = 1,
}

impl OrgRole {
    /// Check if this role has admin privileges.
    ///
    /// # Returns
    ///
    /// `true` only for the Admin role
    pub fn is_admin(&self) -> bool {
        *self >= OrgRole::Admin
    }

    /// Check if this role can manage members.
    ///
    /// This includes inviting and removing members, changing member roles,
    /// and toggling per-member permissions.
    ///
    /// # Returns
    ///
    /// `true` only for the Admin role
    pub fn can_manage_members(&self) -> bool {
        *self >= OrgRole::Admin
    }

    /// Check if this role can delete the organization.
    ///
    /// # Returns
    ///
    /// `true` only for the Admin role
    pub fn can_delete_organization(&self) -> bool {
        *self >= OrgRole::Admin
    }

    /// Parse role from string representation.
    ///
    /// # Arguments
    ///
    /// * `s` - String to parse (case-insensitive)
    ///
    /// # Returns
    ///
    /// `Some(OrgRole)` if valid, `None` otherwise
    ///
    /// # Examples
    ///
    /// ```
    /// use atrium_org::OrgRole;
    ///
    /// assert_eq!(OrgRole::parse("admin"), Some(OrgRole::Admin));
    /// assert_eq!(OrgRole::parse("MEMBER"), Some(OrgRole::Member));
    /// assert_eq!(OrgRole::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// Get string representation of the role.
    ///
    /// # Returns
    ///
    /// Lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Admin => "admin",
        }
    }

    /// Get a human-readable display name for the role.
    ///
    /// # Examples
    ///
    /// ```
    /// use atrium_org::OrgRole;
    ///
    /// assert_eq!(OrgRole::Admin.display_name(), "Admin");
    /// ```
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Member => "Member",
            Self::Admin => "Admin",
        }
    }
}

impl Default for OrgRole {
    fn default() -> Self {
        Self::Member
    }
}
