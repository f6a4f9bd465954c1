//! Entity structs for the Guild Manager feed.
//!
//! Covers the three feed records (`ChatMessage`, `Member`, `AgentAction`)
//! and the read-side views built from them (`GroupStats`, `FeedSnapshot`,
//! `FeedEvent`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{ActionKind, ActionStatus, AgentStatus, MemberRole, MessageKind};
use crate::ids::{ActionId, MemberId, MessageId};

// ---------------------------------------------------------------------------
// Feed records
// ---------------------------------------------------------------------------

/// A single chat message. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChatMessage {
    /// Unique message identifier.
    pub id: MessageId,
    /// Display name of the sender.
    pub sender: String,
    /// Free-text message body.
    pub content: String,
    /// When the message was created.
    pub timestamp: DateTime<Utc>,
    /// Who produced the message.
    pub kind: MessageKind,
}

/// A member of the managed group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Member {
    /// Unique member identifier.
    pub id: MemberId,
    /// Display name.
    pub name: String,
    /// Admin or regular member.
    pub role: MemberRole,
    /// Warnings received so far. Never decreases.
    pub warning_count: u32,
    /// Date the member joined the group.
    pub join_date: NaiveDate,
}

impl Member {
    /// Whether this member may receive warnings.
    pub const fn is_warnable(&self) -> bool {
        matches!(self.role, MemberRole::Member)
    }
}

/// An entry in the agent-action log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentAction {
    /// Unique action identifier.
    pub id: ActionId,
    /// Category tag.
    pub kind: ActionKind,
    /// Human-readable description. May embed a member name as a snapshot.
    pub description: String,
    /// When the action was recorded.
    pub timestamp: DateTime<Utc>,
    /// Recorded outcome.
    pub status: ActionStatus,
}

// ---------------------------------------------------------------------------
// Read-side views
// ---------------------------------------------------------------------------

/// Aggregate counters shown in the dashboard stats grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GroupStats {
    /// Number of members.
    pub total_members: u32,
    /// Members below the active-warning threshold.
    pub active_members: u32,
    /// Sum of all warning counts.
    pub total_warnings: u32,
    /// Current length of the action log.
    pub agent_actions: u32,
}

/// Complete read snapshot of the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct FeedSnapshot {
    /// Chat messages, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Members in seed order.
    pub members: Vec<Member>,
    /// Action log, newest first.
    pub actions: Vec<AgentAction>,
    /// Header activity flag.
    pub agent_status: AgentStatus,
    /// Derived counters.
    pub stats: GroupStats,
}

/// Change notification published by the feed store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum FeedEvent {
    /// A message was appended to the chat.
    MessageAppended(ChatMessage),
    /// An action was prepended to the log.
    ActionRecorded(AgentAction),
    /// A member record changed (warning count).
    MemberUpdated(Member),
    /// The header activity flag changed.
    AgentStatusChanged(AgentStatus),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_is_not_warnable() {
        let mut member = Member {
            id: MemberId::from_u128(1),
            name: String::from("Rahul Kumar"),
            role: MemberRole::Admin,
            warning_count: 0,
            join_date: NaiveDate::default(),
        };
        assert!(!member.is_warnable());
        member.role = MemberRole::Member;
        assert!(member.is_warnable());
    }

    #[test]
    fn feed_event_is_tagged() {
        let event = FeedEvent::AgentStatusChanged(AgentStatus::Idle);
        let json = serde_json::to_value(&event).unwrap_or_default();
        assert_eq!(json["type"], "agent_status_changed");
        assert_eq!(json["payload"], "idle");
    }
}
