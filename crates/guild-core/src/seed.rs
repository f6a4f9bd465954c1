//! Fixed seed dataset loaded on every fresh start.
//!
//! Five named members, the agent's welcome message, and three past
//! actions. Seed records carry small fixed IDs (1..=5 for members) so
//! callers can address them without reading the store first.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use guild_types::{
    ActionId, ActionKind, ActionStatus, AgentAction, ChatMessage, Member, MemberId, MemberRole,
    MessageId, MessageKind,
};

use crate::catalog::WELCOME_MESSAGE;

/// Errors that can occur while building the seed dataset.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    /// A hardcoded join date is not a valid calendar date.
    #[error("invalid seed join date {year}-{month:02}-{day:02}")]
    InvalidJoinDate {
        /// Year component.
        year: i32,
        /// Month component.
        month: u32,
        /// Day component.
        day: u32,
    },
}

/// The records a freshly started store begins with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedState {
    /// Chat history, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Group members in display order.
    pub members: Vec<Member>,
    /// Action log, newest first.
    pub actions: Vec<AgentAction>,
}

/// `(id, name, role, warnings, (year, month, day))` for each seed member.
const SEED_MEMBERS: [(u128, &str, MemberRole, u32, (i32, u32, u32)); 5] = [
    (1, "Rahul Kumar", MemberRole::Admin, 0, (2024, 1, 15)),
    (2, "Priya Sharma", MemberRole::Member, 0, (2024, 2, 20)),
    (3, "Amit Patel", MemberRole::Member, 1, (2024, 3, 10)),
    (4, "Sneha Gupta", MemberRole::Member, 0, (2024, 3, 25)),
    (5, "Vikram Singh", MemberRole::Member, 2, (2024, 4, 5)),
];

/// `(id, kind, description, minutes ago)` for each seed action, newest first.
const SEED_ACTIONS: [(u128, ActionKind, &str, i64); 3] = [
    (3, ActionKind::AutoModeration, "Deleted promotional link", 1),
    (
        2,
        ActionKind::WarningIssued,
        "Warned member for inappropriate content",
        3,
    ),
    (
        1,
        ActionKind::SpamDetected,
        "Detected spam message from user",
        5,
    ),
];

/// Build the seed dataset with timestamps relative to `now`.
///
/// # Errors
///
/// Returns [`SeedError::InvalidJoinDate`] if a hardcoded date is invalid.
pub fn seed_state(now: DateTime<Utc>, agent_name: &str) -> Result<SeedState, SeedError> {
    let members = SEED_MEMBERS
        .iter()
        .map(|&(id, name, role, warning_count, (year, month, day))| {
            let join_date = NaiveDate::from_ymd_opt(year, month, day)
                .ok_or(SeedError::InvalidJoinDate { year, month, day })?;
            Ok(Member {
                id: MemberId::from_u128(id),
                name: name.to_owned(),
                role,
                warning_count,
                join_date,
            })
        })
        .collect::<Result<Vec<_>, SeedError>>()?;

    let actions = SEED_ACTIONS
        .iter()
        .map(|&(id, kind, description, minutes_ago)| AgentAction {
            id: ActionId::from_u128(id),
            kind,
            description: description.to_owned(),
            timestamp: minutes_before(now, minutes_ago),
            status: ActionStatus::Success,
        })
        .collect();

    let messages = vec![ChatMessage {
        id: MessageId::from_u128(1),
        sender: agent_name.to_owned(),
        content: WELCOME_MESSAGE.to_owned(),
        timestamp: now,
        kind: MessageKind::Agent,
    }];

    Ok(SeedState {
        messages,
        members,
        actions,
    })
}

fn minutes_before(now: DateTime<Utc>, minutes: i64) -> DateTime<Utc> {
    TimeDelta::try_minutes(minutes)
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(now)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_720_000_000, 0).unwrap()
    }

    #[test]
    fn seed_has_expected_shape() {
        let seed = seed_state(now(), "Guild Agent").unwrap();
        assert_eq!(seed.members.len(), 5);
        assert_eq!(seed.messages.len(), 1);
        assert_eq!(seed.actions.len(), 3);
    }

    #[test]
    fn seed_member_three_is_amit() {
        let seed = seed_state(now(), "Guild Agent").unwrap();
        let amit = seed
            .members
            .iter()
            .find(|m| m.id == MemberId::from_u128(3))
            .unwrap();
        assert_eq!(amit.name, "Amit Patel");
        assert_eq!(amit.warning_count, 1);
        assert_eq!(amit.role, MemberRole::Member);
        assert_eq!(amit.join_date, NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn only_first_member_is_admin() {
        let seed = seed_state(now(), "Guild Agent").unwrap();
        let admins: Vec<&str> = seed
            .members
            .iter()
            .filter(|m| m.role == MemberRole::Admin)
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(admins, vec!["Rahul Kumar"]);
    }

    #[test]
    fn seed_actions_are_newest_first() {
        let seed = seed_state(now(), "Guild Agent").unwrap();
        let stamps: Vec<DateTime<Utc>> = seed.actions.iter().map(|a| a.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(seed.actions[0].kind, ActionKind::AutoModeration);
        assert_eq!(
            seed.actions[2].timestamp,
            now() - TimeDelta::try_minutes(5).unwrap()
        );
    }

    #[test]
    fn welcome_message_comes_from_agent() {
        let seed = seed_state(now(), "Moderator").unwrap();
        let welcome = &seed.messages[0];
        assert_eq!(welcome.sender, "Moderator");
        assert_eq!(welcome.kind, MessageKind::Agent);
        assert_eq!(welcome.content, WELCOME_MESSAGE);
    }
}
