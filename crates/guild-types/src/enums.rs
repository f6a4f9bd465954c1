//! Enumeration types for the Guild Manager feed.
//!
//! All enums serialize in `snake_case` so the dashboard sees the same
//! string tags (`"user"`, `"warning_issued"`, ...) it renders.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Origin of a chat message. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MessageKind {
    /// Typed by the dashboard user.
    User,
    /// Produced by the simulated guild agent.
    Agent,
    /// Emitted by the system (e.g. warning notices).
    System,
}

/// Role of a group member. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum MemberRole {
    /// Group administrator. Cannot be warned.
    Admin,
    /// Regular member.
    Member,
}

/// Category tag of an agent action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// A spam message was detected.
    SpamDetected,
    /// A member received a warning.
    WarningIssued,
    /// Messages were moderated automatically.
    AutoModeration,
    /// A new member was welcomed.
    MemberWelcome,
    /// A suspicious link was blocked.
    SpamPrevention,
    /// An activity report was generated.
    ActivitySummary,
    /// Members were reminded of the rules.
    RuleEnforcement,
}

impl ActionKind {
    /// The wire tag for this kind, identical to its serde form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpamDetected => "spam_detected",
            Self::WarningIssued => "warning_issued",
            Self::AutoModeration => "auto_moderation",
            Self::MemberWelcome => "member_welcome",
            Self::SpamPrevention => "spam_prevention",
            Self::ActivitySummary => "activity_summary",
            Self::RuleEnforcement => "rule_enforcement",
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome recorded for an agent action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionStatus {
    /// The action completed.
    Success,
    /// The action is still in progress.
    Pending,
    /// The action did not complete.
    Failed,
}

/// Cosmetic activity flag shown in the dashboard header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AgentStatus {
    /// The periodic activity task is running.
    Active,
    /// The periodic activity task is paused or stopped.
    Idle,
}
