//! Membership engine facade
//!
//! One entry point wiring the mutating services to the store, the retry
//! policy, and the post-commit event sink. Every operation runs inside a
//! single transaction; only conflicts are retried, and events are
//! dispatched after the transaction has committed.

use std::sync::Arc;
use uuid::Uuid;

use atrium_org::{Organization, OrganizationSummary, OrgRole};
use atrium_store::Store;

use crate::active::ActiveSwitchService;
use crate::error::{MembershipError, MembershipResult};
use crate::events::{EventSink, MembershipEvent, NullSink};
use crate::lifecycle::LifecycleService;
use crate::removal::RemovalService;
use crate::retry::{with_retry_if, RetryConfig};
use crate::roles::RoleService;

/// Uniform success result of a mutating operation.
#[derive(Debug, Clone)]
pub struct Outcome {
    /// Whether the operation took effect
    pub ok: bool,

    /// Human-readable description of what happened
    pub message: String,
}

impl Outcome {
    fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }
}

/// The organization membership consistency engine.
///
/// # Examples
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use atrium_membership::MembershipEngine;
/// use atrium_org::OrgRole;
/// use atrium_store::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), atrium_membership::MembershipError> {
/// let engine = MembershipEngine::new(Arc::new(MemoryStore::new()));
///
/// let alice = Uuid::now_v7();
/// let bob = Uuid::now_v7();
///
/// let org = engine.create_organization(alice, "Acme Corp").await?;
/// engine.add_member(org.id, alice, bob, OrgRole::Member).await?;
/// engine.update_role(org.id, alice, bob, OrgRole::Admin).await?;
/// engine.switch_active(bob, org.id).await?;
/// # Ok(())
/// # }
/// ```
pub struct MembershipEngine {
    roles: RoleService,
    removal: RemovalService,
    active: ActiveSwitchService,
    lifecycle: LifecycleService,
    sink: Arc<dyn EventSink>,
    retry: RetryConfig,
}

impl MembershipEngine {
    /// Create an engine over `store` with no event sink and the default
    /// retry policy.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            roles: RoleService::new(store.clone()),
            removal: RemovalService::new(store.clone()),
            active: ActiveSwitchService::new(store.clone()),
            lifecycle: LifecycleService::new(store),
            sink: Arc::new(NullSink),
            retry: RetryConfig::default(),
        }
    }

    /// Set the sink receiving post-commit events.
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Set the retry policy for conflicted transactions.
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Change a member's role. See [`RoleService::update_role`].
    pub async fn update_role(
        &self,
        org_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
        new_role: OrgRole,
    ) -> MembershipResult<Outcome> {
        let event = with_retry_if(
            &self.retry,
            || self.roles.update_role(org_id, actor_id, target_id, new_role),
            MembershipError::is_retryable,
        )
        .await?;

        match event {
            Some(event) => {
                self.dispatch(event).await;
                Ok(Outcome::success("member role updated"))
            }
            None => Ok(Outcome::success("member role unchanged")),
        }
    }

    /// Toggle a member's ticket-deletion permission.
    pub async fn set_can_delete_tickets(
        &self,
        org_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
        allowed: bool,
    ) -> MembershipResult<Outcome> {
        let event = with_retry_if(
            &self.retry,
            || {
                self.roles
                    .set_can_delete_tickets(org_id, actor_id, target_id, allowed)
            },
            MembershipError::is_retryable,
        )
        .await?;

        match event {
            Some(event) => {
                self.dispatch(event).await;
                Ok(Outcome::success("ticket deletion permission updated"))
            }
            None => Ok(Outcome::success("ticket deletion permission unchanged")),
        }
    }

    /// Remove a member (self-leave or admin removal).
    /// See [`RemovalService::remove_member`].
    pub async fn remove_member(
        &self,
        org_id: Uuid,
        actor_id: Uuid,
        target_id: Uuid,
    ) -> MembershipResult<Outcome> {
        let event = with_retry_if(
            &self.retry,
            || self.removal.remove_member(org_id, actor_id, target_id),
            MembershipError::is_retryable,
        )
        .await?;

        let message = if actor_id == target_id {
            "left organization"
        } else {
            "member removed"
        };
        self.dispatch(event).await;
        Ok(Outcome::success(message))
    }

    /// Make `org_id` the user's single active organization.
    /// See [`ActiveSwitchService::switch_active`].
    pub async fn switch_active(&self, user_id: Uuid, org_id: Uuid) -> MembershipResult<Outcome> {
        let event = with_retry_if(
            &self.retry,
            || self.active.switch_active(user_id, org_id),
            MembershipError::is_retryable,
        )
        .await?;

        self.dispatch(event).await;
        Ok(Outcome::success("active organization switched"))
    }

    /// Create an organization with the actor as founding admin.
    /// See [`LifecycleService::create_organization`].
    pub async fn create_organization(
        &self,
        actor_id: Uuid,
        name: &str,
    ) -> MembershipResult<Organization> {
        let (organization, event) = with_retry_if(
            &self.retry,
            || self.lifecycle.create_organization(actor_id, name),
            MembershipError::is_retryable,
        )
        .await?;

        self.dispatch(event).await;
        Ok(organization)
    }

    /// Delete an organization and its memberships.
    /// See [`LifecycleService::delete_organization`].
    pub async fn delete_organization(
        &self,
        org_id: Uuid,
        actor_id: Uuid,
    ) -> MembershipResult<Outcome> {
        let event = with_retry_if(
            &self.retry,
            || self.lifecycle.delete_organization(org_id, actor_id),
            MembershipError::is_retryable,
        )
        .await?;

        self.dispatch(event).await;
        Ok(Outcome::success("organization deleted"))
    }

    /// Add a user to an organization. See [`LifecycleService::add_member`].
    pub async fn add_member(
        &self,
        org_id: Uuid,
        actor_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
    ) -> MembershipResult<Outcome> {
        let event = with_retry_if(
            &self.retry,
            || self.lifecycle.add_member(org_id, actor_id, user_id, role),
            MembershipError::is_retryable,
        )
        .await?;

        self.dispatch(event).await;
        Ok(Outcome::success("member added"))
    }

    /// List a user's organizations for the org switcher.
    pub async fn organizations_for_user(
        &self,
        user_id: Uuid,
    ) -> MembershipResult<Vec<OrganizationSummary>> {
        self.lifecycle.organizations_for_user(user_id).await
    }

    /// Publish a post-commit event, best-effort.
    ///
    /// The mutation is already durable; a sink failure is logged, never
    /// surfaced to the caller.
    async fn dispatch(&self, event: MembershipEvent) {
        let topic = event.topic();
        if let Err(e) = self.sink.publish(event).await {
            tracing::warn!(topic, error = %e, "Post-commit event dispatch failed");
        }
    }
}
