//! Membership invariant checks
//!
//! Pure functions over an in-memory membership snapshot. Every mutating
//! service evaluates these against the snapshot it read inside its own
//! transaction, so the rules are defined once and never checked against
//! stale data.
//!
//! The invariants guarded here:
//! 1. An organization always has at least one member.
//! 2. An organization always has at least one admin.
//! 3. A user has at most one active organization.

use uuid::Uuid;

use crate::membership::Membership;

/// Number of admins in an organization snapshot.
pub fn admin_count(memberships: &[Membership]) -> usize {
    memberships.iter().filter(|m| m.is_admin()).count()
}

/// Number of members in an organization snapshot.
pub fn member_count(memberships: &[Membership]) -> usize {
    memberships.len()
}

/// Number of active memberships in a user's full membership list.
///
/// Anything above 1 indicates corrupted state; the engine never commits it.
pub fn active_count(memberships: &[Membership]) -> usize {
    memberships.iter().filter(|m| m.is_active).count()
}

/// Check whether `user_id` is the only admin in the snapshot.
///
/// Returns `true` iff the snapshot contains exactly one admin and that
/// admin is `user_id`. Demoting or removing this membership would leave
/// the organization without an admin.
pub fn is_last_admin(memberships: &[Membership], user_id: Uuid) -> bool {
    let mut admins = memberships.iter().filter(|m| m.is_admin());
    match (admins.next(), admins.next()) {
        (Some(only), None) => only.user_id == user_id,
        _ => false,
    }
}

/// Check whether the snapshot holds exactly one membership.
///
/// Removing it would leave the organization empty; the organization must
/// be deleted outright instead.
pub fn is_last_member(memberships: &[Membership]) -> bool {
    memberships.len() == 1
}

/// Check whether `user_id` is the only member in the snapshot.
pub fn is_sole_member(memberships: &[Membership], user_id: Uuid) -> bool {
    matches!(memberships, [only] if only.user_id == user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::OrgRole;

    fn snapshot(roles: &[(Uuid, OrgRole)]) -> Vec<Membership> {
        let org_id = Uuid::now_v7();
        roles
            .iter()
            .map(|(user_id, role)| Membership::new(org_id, *user_id, *role))
            .collect()
    }

    #[test]
    fn test_admin_count() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        let c = Uuid::now_v7();

        let ms = snapshot(&[(a, OrgRole::Admin), (b, OrgRole::Admin), (c, OrgRole::Member)]);
        assert_eq!(admin_count(&ms), 2);
        assert_eq!(member_count(&ms), 3);
    }

    #[test]
    fn test_is_last_admin() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        let ms = snapshot(&[(a, OrgRole::Admin), (b, OrgRole::Member)]);
        assert!(is_last_admin(&ms, a));
        assert!(!is_last_admin(&ms, b));
    }

    #[test]
    fn test_is_last_admin_with_two_admins() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        let ms = snapshot(&[(a, OrgRole::Admin), (b, OrgRole::Admin)]);
        assert!(!is_last_admin(&ms, a));
        assert!(!is_last_admin(&ms, b));
    }

    #[test]
    fn test_is_last_admin_on_empty_snapshot() {
        assert!(!is_last_admin(&[], Uuid::now_v7()));
    }

    #[test]
    fn test_is_last_member() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        let one = snapshot(&[(a, OrgRole::Admin)]);
        assert!(is_last_member(&one));
        assert!(is_sole_member(&one, a));
        assert!(!is_sole_member(&one, b));

        let two = snapshot(&[(a, OrgRole::Admin), (b, OrgRole::Member)]);
        assert!(!is_last_member(&two));
        assert!(!is_sole_member(&two, a));
    }

    #[test]
    fn test_active_count() {
        let user = Uuid::now_v7();
        let mut ms: Vec<Membership> = (0..3)
            .map(|_| Membership::new(Uuid::now_v7(), user, OrgRole::Member))
            .collect();
        assert_eq!(active_count(&ms), 0);

        ms[1].is_active = true;
        assert_eq!(active_count(&ms), 1);
    }
}
