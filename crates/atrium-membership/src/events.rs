//! Post-commit membership events
//!
//! Every committed mutation yields one event describing what changed.
//! Events are handed to an [`EventSink`] strictly after the transaction
//! commits; notification and email fan-out must never run inside the
//! transaction, where it would hold row locks across slow external calls.
//! A sink failure is logged and swallowed by the engine: the mutation is
//! already durable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use atrium_org::OrgRole;

/// A committed membership mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MembershipEvent {
    /// An organization was created with its founding admin
    OrganizationCreated {
        organization_id: Uuid,
        name: String,
        created_by: Uuid,
    },

    /// An organization and all its memberships were deleted
    OrganizationDeleted {
        organization_id: Uuid,
        deleted_by: Uuid,
    },

    /// A user was added to an organization
    MemberAdded {
        organization_id: Uuid,
        user_id: Uuid,
        role: OrgRole,
        invited_by: Uuid,
    },

    /// A membership was removed; `left` distinguishes self-leave from a
    /// removal by an admin
    MemberRemoved {
        organization_id: Uuid,
        user_id: Uuid,
        removed_by: Uuid,
        left: bool,
    },

    /// A member's role changed
    RoleChanged {
        organization_id: Uuid,
        user_id: Uuid,
        old_role: OrgRole,
        new_role: OrgRole,
        changed_by: Uuid,
    },

    /// A member's ticket-deletion permission changed
    TicketPermissionChanged {
        organization_id: Uuid,
        user_id: Uuid,
        can_delete_tickets: bool,
        changed_by: Uuid,
    },

    /// A user's active organization changed
    ActiveOrganizationChanged {
        user_id: Uuid,
        organization_id: Uuid,
        previous: Option<Uuid>,
    },
}

impl MembershipEvent {
    /// Topic string for routing, `org.<entity>.<verb>`.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::OrganizationCreated { .. } => "org.organization.created",
            Self::OrganizationDeleted { .. } => "org.organization.deleted",
            Self::MemberAdded { .. } => "org.member.added",
            Self::MemberRemoved { .. } => "org.member.removed",
            Self::RoleChanged { .. } => "org.member.role_changed",
            Self::TicketPermissionChanged { .. } => "org.member.permission_changed",
            Self::ActiveOrganizationChanged { .. } => "org.context.switched",
        }
    }
}

/// Event sink error.
#[derive(Debug, Error)]
#[error("Event sink error: {0}")]
pub struct SinkError(pub String);

/// Destination for post-commit events.
///
/// Implementations bridge to the notification/job-queue subsystems. The
/// engine treats publishing as best-effort.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publish one event.
    async fn publish(&self, event: MembershipEvent) -> Result<(), SinkError>;
}

/// Sink that drops every event.
#[derive(Debug, Clone, Default)]
pub struct NullSink;

#[async_trait]
impl EventSink for NullSink {
    async fn publish(&self, _event: MembershipEvent) -> Result<(), SinkError> {
        Ok(())
    }
}

/// In-process broadcast sink.
///
/// Suitable for single-process deployments and tests; subscribers receive
/// every event published after they subscribe.
pub struct MemorySink {
    sender: broadcast::Sender<MembershipEvent>,
}

impl std::fmt::Debug for MemorySink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySink").finish()
    }
}

impl MemorySink {
    /// Create a new sink with the default channel capacity.
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Create with custom channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MembershipEvent> {
        self.sender.subscribe()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for MemorySink {
    async fn publish(&self, event: MembershipEvent) -> Result<(), SinkError> {
        // A send with no live subscribers is not a failure
        let _ = self.sender.send(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_sink_delivers_to_subscriber() {
        let sink = MemorySink::new();
        let mut rx = sink.subscribe();

        let org_id = Uuid::now_v7();
        sink.publish(MembershipEvent::OrganizationDeleted {
            organization_id: org_id,
            deleted_by: Uuid::now_v7(),
        })
        .await
        .unwrap();

        match rx.recv().await.unwrap() {
            MembershipEvent::OrganizationDeleted {
                organization_id, ..
            } => assert_eq!(organization_id, org_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let sink = MemorySink::new();
        let result = sink
            .publish(MembershipEvent::ActiveOrganizationChanged {
                user_id: Uuid::now_v7(),
                organization_id: Uuid::now_v7(),
                previous: None,
            })
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn test_event_topics() {
        let event = MembershipEvent::MemberRemoved {
            organization_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            removed_by: Uuid::now_v7(),
            left: true,
        };
        assert_eq!(event.topic(), "org.member.removed");
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let event = MembershipEvent::RoleChanged {
            organization_id: Uuid::now_v7(),
            user_id: Uuid::now_v7(),
            old_role: OrgRole::Member,
            new_role: OrgRole::Admin,
            changed_by: Uuid::now_v7(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"role_changed\""));

        let back: MembershipEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back.topic(), event.topic());
    }
}
