//! In-memory store implementation
//!
//! This is suitable for single-process deployments and testing. It models
//! the same guarantees the engine expects from a relational backend:
//! per-scope row locking with bounded acquisition, atomic commit of a
//! transaction's writes, and full rollback when a transaction is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tokio::time::timeout;
use uuid::Uuid;

use atrium_org::{Membership, Organization};

use crate::error::{StoreError, StoreResult};
use crate::store::{LockKey, LockScope, MembershipPatch, Store, Transaction};

/// Default bound on lock acquisition before a transaction fails with
/// [`StoreError::Conflict`].
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Tables {
    organizations: HashMap<Uuid, Organization>,
    // Keyed by (organization_id, user_id), the membership's composite identity
    memberships: HashMap<(Uuid, Uuid), Membership>,
}

/// Buffered row write, applied at commit in submission order.
#[derive(Debug, Clone)]
enum RowWrite {
    PutMembership(Membership),
    DeleteMembership { org_id: Uuid, user_id: Uuid },
    PutOrganization(Organization),
    DeleteOrganization(Uuid),
}

/// In-memory transactional membership store.
///
/// State lives behind an `RwLock`; each [`LockKey`] maps to its own
/// `Mutex`, so transactions queue only against transactions whose scope
/// overlaps theirs. Lock acquisition is bounded by the store's lock
/// timeout and surfaces as a retryable conflict when it elapses.
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    locks: Arc<RwLock<HashMap<LockKey, Arc<Mutex<()>>>>>,
    lock_timeout: Duration,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("lock_timeout", &self.lock_timeout)
            .finish()
    }
}

impl MemoryStore {
    /// Create a new in-memory store with the default lock timeout.
    pub fn new() -> Self {
        Self::with_lock_timeout(DEFAULT_LOCK_TIMEOUT)
    }

    /// Create with a custom lock timeout.
    ///
    /// Tests exercising conflict handling use a short timeout so a held
    /// lock surfaces as [`StoreError::Conflict`] quickly.
    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            locks: Arc::new(RwLock::new(HashMap::new())),
            lock_timeout,
        }
    }

    async fn lock_for(&self, key: LockKey) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(&key) {
            return lock.clone();
        }
        self.locks
            .write()
            .await
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self, scope: LockScope) -> StoreResult<Box<dyn Transaction>> {
        let mut guards = Vec::with_capacity(scope.keys().len());
        // Keys come pre-sorted from LockScope, so overlapping scopes always
        // acquire in the same order.
        for key in scope.keys() {
            let lock = self.lock_for(*key).await;
            match timeout(self.lock_timeout, lock.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    tracing::warn!(
                        ?key,
                        timeout_ms = self.lock_timeout.as_millis() as u64,
                        "Lock acquisition timed out"
                    );
                    return Err(StoreError::Conflict(format!(
                        "lock acquisition timed out for {:?}",
                        key
                    )));
                }
            }
        }

        Ok(Box::new(MemoryTransaction {
            tables: self.tables.clone(),
            _guards: guards,
            writes: Vec::new(),
        }))
    }

    async fn membership(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<Membership> {
        self.tables
            .read()
            .await
            .memberships
            .get(&(org_id, user_id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("membership {}/{}", org_id, user_id)))
    }

    async fn memberships_by_organization(&self, org_id: Uuid) -> StoreResult<Vec<Membership>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables
                .memberships
                .values()
                .filter(|m| m.organization_id == org_id)
                .cloned()
                .collect(),
        ))
    }

    async fn memberships_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables
                .memberships
                .values()
                .filter(|m| m.user_id == user_id)
                .cloned()
                .collect(),
        ))
    }

    async fn organization(&self, org_id: Uuid) -> StoreResult<Organization> {
        self.tables
            .read()
            .await
            .organizations
            .get(&org_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("organization {}", org_id)))
    }
}

/// Stable row order for snapshots: join order, then user id as tiebreaker.
fn sorted(mut memberships: Vec<Membership>) -> Vec<Membership> {
    memberships.sort_by_key(|m| (m.joined_at, m.user_id));
    memberships
}

/// One open transaction against a [`MemoryStore`].
///
/// Writes are buffered in submission order and replayed atomically under
/// the table write lock at commit. Reads overlay the buffer on the base
/// tables, so a transaction observes its own writes. Dropping the
/// transaction releases its scope locks and discards the buffer.
struct MemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    _guards: Vec<OwnedMutexGuard<()>>,
    writes: Vec<RowWrite>,
}

impl MemoryTransaction {
    /// Effective value of one membership row: base overlaid with writes.
    fn project_membership(
        &self,
        tables: &Tables,
        org_id: Uuid,
        user_id: Uuid,
    ) -> Option<Membership> {
        let mut row = tables.memberships.get(&(org_id, user_id)).cloned();
        for write in &self.writes {
            match write {
                RowWrite::PutMembership(m)
                    if m.organization_id == org_id && m.user_id == user_id =>
                {
                    row = Some(m.clone());
                }
                RowWrite::DeleteMembership {
                    org_id: o,
                    user_id: u,
                } if *o == org_id && *u == user_id => {
                    row = None;
                }
                RowWrite::DeleteOrganization(o) if *o == org_id => {
                    row = None;
                }
                _ => {}
            }
        }
        row
    }

    /// Effective membership rows matching `filter`, base overlaid with writes.
    fn project_memberships<F>(&self, tables: &Tables, filter: F) -> Vec<Membership>
    where
        F: Fn(&Membership) -> bool,
    {
        let mut rows: HashMap<(Uuid, Uuid), Membership> = tables
            .memberships
            .iter()
            .filter(|(_, m)| filter(m))
            .map(|(k, m)| (*k, m.clone()))
            .collect();

        for write in &self.writes {
            match write {
                RowWrite::PutMembership(m) => {
                    let key = (m.organization_id, m.user_id);
                    if filter(m) {
                        rows.insert(key, m.clone());
                    } else {
                        rows.remove(&key);
                    }
                }
                RowWrite::DeleteMembership { org_id, user_id } => {
                    rows.remove(&(*org_id, *user_id));
                }
                RowWrite::DeleteOrganization(org_id) => {
                    rows.retain(|(o, _), _| o != org_id);
                }
                RowWrite::PutOrganization(_) => {}
            }
        }

        sorted(rows.into_values().collect())
    }

    /// Effective value of one organization row.
    fn project_organization(&self, tables: &Tables, org_id: Uuid) -> Option<Organization> {
        let mut row = tables.organizations.get(&org_id).cloned();
        for write in &self.writes {
            match write {
                RowWrite::PutOrganization(o) if o.id == org_id => row = Some(o.clone()),
                RowWrite::DeleteOrganization(o) if *o == org_id => row = None,
                _ => {}
            }
        }
        row
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn membership(&self, org_id: Uuid, user_id: Uuid) -> StoreResult<Membership> {
        let tables = self.tables.read().await;
        self.project_membership(&tables, org_id, user_id)
            .ok_or_else(|| StoreError::NotFound(format!("membership {}/{}", org_id, user_id)))
    }

    async fn memberships_by_organization(&self, org_id: Uuid) -> StoreResult<Vec<Membership>> {
        let tables = self.tables.read().await;
        Ok(self.project_memberships(&tables, |m| m.organization_id == org_id))
    }

    async fn memberships_by_user(&self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        let tables = self.tables.read().await;
        Ok(self.project_memberships(&tables, |m| m.user_id == user_id))
    }

    async fn insert_membership(&mut self, membership: Membership) -> StoreResult<()> {
        let tables = self.tables.read().await;
        let org_id = membership.organization_id;
        let user_id = membership.user_id;

        if self.project_organization(&tables, org_id).is_none() {
            return Err(StoreError::NotFound(format!("organization {}", org_id)));
        }
        if self.project_membership(&tables, org_id, user_id).is_some() {
            return Err(StoreError::AlreadyExists(format!(
                "membership {}/{}",
                org_id, user_id
            )));
        }

        self.writes.push(RowWrite::PutMembership(membership));
        Ok(())
    }

    async fn update_membership(
        &mut self,
        org_id: Uuid,
        user_id: Uuid,
        patch: MembershipPatch,
    ) -> StoreResult<()> {
        let tables = self.tables.read().await;
        let mut row = self
            .project_membership(&tables, org_id, user_id)
            .ok_or_else(|| StoreError::NotFound(format!("membership {}/{}", org_id, user_id)))?;

        patch.apply(&mut row);
        self.writes.push(RowWrite::PutMembership(row));
        Ok(())
    }

    async fn delete_membership(&mut self, org_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        let tables = self.tables.read().await;
        if self.project_membership(&tables, org_id, user_id).is_none() {
            return Err(StoreError::NotFound(format!(
                "membership {}/{}",
                org_id, user_id
            )));
        }

        self.writes.push(RowWrite::DeleteMembership { org_id, user_id });
        Ok(())
    }

    async fn organization(&self, org_id: Uuid) -> StoreResult<Organization> {
        let tables = self.tables.read().await;
        self.project_organization(&tables, org_id)
            .ok_or_else(|| StoreError::NotFound(format!("organization {}", org_id)))
    }

    async fn insert_organization(&mut self, organization: Organization) -> StoreResult<()> {
        let tables = self.tables.read().await;
        if self
            .project_organization(&tables, organization.id)
            .is_some()
        {
            return Err(StoreError::AlreadyExists(format!(
                "organization {}",
                organization.id
            )));
        }

        self.writes.push(RowWrite::PutOrganization(organization));
        Ok(())
    }

    async fn delete_organization(&mut self, org_id: Uuid) -> StoreResult<()> {
        let tables = self.tables.read().await;
        if self.project_organization(&tables, org_id).is_none() {
            return Err(StoreError::NotFound(format!("organization {}", org_id)));
        }

        self.writes.push(RowWrite::DeleteOrganization(org_id));
        Ok(())
    }

    async fn commit(mut self: Box<Self>) -> StoreResult<()> {
        let writes = std::mem::take(&mut self.writes);
        let write_count = writes.len();
        let mut tables = self.tables.write().await;

        for write in writes {
            match write {
                RowWrite::PutMembership(m) => {
                    tables
                        .memberships
                        .insert((m.organization_id, m.user_id), m);
                }
                RowWrite::DeleteMembership { org_id, user_id } => {
                    tables.memberships.remove(&(org_id, user_id));
                }
                RowWrite::PutOrganization(o) => {
                    tables.organizations.insert(o.id, o);
                }
                RowWrite::DeleteOrganization(org_id) => {
                    tables.organizations.remove(&org_id);
                    tables.memberships.retain(|(o, _), _| *o != org_id);
                }
            }
        }

        tracing::debug!(writes = write_count, "Transaction committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atrium_org::OrgRole;

    async fn store_with_org() -> (MemoryStore, Organization) {
        let store = MemoryStore::new();
        let org = Organization::new("Acme Corp");

        let mut tx = store.begin(LockScope::organization(org.id)).await.unwrap();
        tx.insert_organization(org.clone()).await.unwrap();
        tx.commit().await.unwrap();

        (store, org)
    }

    #[tokio::test]
    async fn test_reads_observe_own_writes_before_commit() {
        let (store, org) = store_with_org().await;
        let user = Uuid::now_v7();

        let mut tx = store.begin(LockScope::organization(org.id)).await.unwrap();
        tx.insert_membership(Membership::new(org.id, user, OrgRole::Admin))
            .await
            .unwrap();

        // Visible inside the transaction
        assert!(tx.membership(org.id, user).await.is_ok());
        assert_eq!(tx.memberships_by_organization(org.id).await.unwrap().len(), 1);

        // Not visible outside until commit
        assert!(matches!(
            store.membership(org.id, user).await,
            Err(StoreError::NotFound(_))
        ));

        tx.commit().await.unwrap();
        assert!(store.membership(org.id, user).await.is_ok());
    }

    #[tokio::test]
    async fn test_drop_rolls_back_buffered_writes() {
        let (store, org) = store_with_org().await;
        let user = Uuid::now_v7();

        {
            let mut tx = store.begin(LockScope::organization(org.id)).await.unwrap();
            tx.insert_membership(Membership::new(org.id, user, OrgRole::Admin))
                .await
                .unwrap();
            // Dropped without commit
        }

        assert!(matches!(
            store.membership(org.id, user).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_require_existing_row() {
        let (store, org) = store_with_org().await;
        let user = Uuid::now_v7();

        let mut tx = store.begin(LockScope::organization(org.id)).await.unwrap();
        assert!(matches!(
            tx.update_membership(org.id, user, MembershipPatch::set_active(true))
                .await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            tx.delete_membership(org.id, user).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_insert_membership_requires_organization() {
        let store = MemoryStore::new();
        let org_id = Uuid::now_v7();

        let mut tx = store.begin(LockScope::organization(org_id)).await.unwrap();
        let result = tx
            .insert_membership(Membership::new(org_id, Uuid::now_v7(), OrgRole::Admin))
            .await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_membership_insert_is_rejected() {
        let (store, org) = store_with_org().await;
        let user = Uuid::now_v7();

        let mut tx = store.begin(LockScope::organization(org.id)).await.unwrap();
        tx.insert_membership(Membership::new(org.id, user, OrgRole::Admin))
            .await
            .unwrap();
        let result = tx
            .insert_membership(Membership::new(org.id, user, OrgRole::Member))
            .await;
        assert!(matches!(result, Err(StoreError::AlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_delete_organization_cascades_memberships() {
        let (store, org) = store_with_org().await;
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        let mut tx = store.begin(LockScope::organization(org.id)).await.unwrap();
        tx.insert_membership(Membership::new(org.id, a, OrgRole::Admin))
            .await
            .unwrap();
        tx.insert_membership(Membership::new(org.id, b, OrgRole::Member))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin(LockScope::organization(org.id)).await.unwrap();
        tx.delete_organization(org.id).await.unwrap();
        // Cascade is visible inside the transaction
        assert!(tx
            .memberships_by_organization(org.id)
            .await
            .unwrap()
            .is_empty());
        tx.commit().await.unwrap();

        assert!(store.organization(org.id).await.is_err());
        assert!(store
            .memberships_by_organization(org.id)
            .await
            .unwrap()
            .is_empty());
        assert!(store.memberships_by_user(a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overlay_list_reflects_buffered_delete_and_insert() {
        let (store, org) = store_with_org().await;
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();

        let mut tx = store.begin(LockScope::organization(org.id)).await.unwrap();
        tx.insert_membership(Membership::new(org.id, a, OrgRole::Admin))
            .await
            .unwrap();
        tx.commit().await.unwrap();

        let mut tx = store.begin(LockScope::organization(org.id)).await.unwrap();
        tx.delete_membership(org.id, a).await.unwrap();
        tx.insert_membership(Membership::new(org.id, b, OrgRole::Admin))
            .await
            .unwrap();

        let rows = tx.memberships_by_organization(org.id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, b);
    }

    #[tokio::test]
    async fn test_conflicting_scopes_time_out() {
        let store = MemoryStore::with_lock_timeout(Duration::from_millis(20));
        let org = Uuid::now_v7();

        let _held = store.begin(LockScope::organization(org)).await.unwrap();

        let result = store.begin(LockScope::organization(org)).await;
        assert!(matches!(
            result.map(|_| ()),
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_unrelated_scopes_do_not_contend() {
        let store = MemoryStore::with_lock_timeout(Duration::from_millis(20));

        let _held = store
            .begin(LockScope::organization(Uuid::now_v7()))
            .await
            .unwrap();

        assert!(store
            .begin(LockScope::organization(Uuid::now_v7()))
            .await
            .is_ok());
        assert!(store.begin(LockScope::user(Uuid::now_v7())).await.is_ok());
    }

    #[tokio::test]
    async fn test_combined_scope_contends_with_each_component() {
        let store = MemoryStore::with_lock_timeout(Duration::from_millis(20));
        let user = Uuid::now_v7();
        let org = Uuid::now_v7();

        let _held = store
            .begin(LockScope::user_and_organization(user, org))
            .await
            .unwrap();

        assert!(store.begin(LockScope::organization(org)).await.is_err());
        assert!(store.begin(LockScope::user(user)).await.is_err());
    }

    #[tokio::test]
    async fn test_locks_release_on_drop() {
        let store = MemoryStore::with_lock_timeout(Duration::from_millis(20));
        let org = Uuid::now_v7();

        {
            let _held = store.begin(LockScope::organization(org)).await.unwrap();
        }

        assert!(store.begin(LockScope::organization(org)).await.is_ok());
    }
}
