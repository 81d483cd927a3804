//! # Atrium Organization Domain
//!
//! This crate provides the organization membership domain model for the
//! Atrium ticket-tracking platform.
//!
//! ## Overview
//!
//! The atrium-org crate handles:
//! - **Organizations**: Top-level tenant entities
//! - **Memberships**: User-organization relationships with role, active
//!   flag, and per-member ticket permissions
//! - **Roles**: Member/Admin role model
//! - **Invariants**: Pure checks over membership snapshots
//!
//! ## Architecture
//!
//! ```text
//! User
//!   └─ Membership ─→ Organization
//!        ├─ role (member | admin)
//!        ├─ is_active (at most one per user)
//!        └─ can_delete_tickets
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use atrium_org::{invariants, Membership, Organization, OrgRole};
//! use uuid::Uuid;
//!
//! let org = Organization::new("Acme Corp");
//!
//! let admin_id = Uuid::now_v7();
//! let membership = Membership::new(org.id, admin_id, OrgRole::Admin);
//!
//! let snapshot = vec![membership];
//! assert!(invariants::is_last_admin(&snapshot, admin_id));
//! ```
//!
//! This crate holds no I/O and no business flow; the transactional rules
//! that keep membership state valid live in `atrium-membership`, backed by
//! `atrium-store`.

pub mod invariants;
pub mod membership;
pub mod organization;
pub mod roles;

// Re-export main types for convenience
pub use membership::Membership;
pub use organization::{Organization, OrganizationSummary};
pub use roles::OrgRole;
