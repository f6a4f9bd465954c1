//! The event feed store: messages, members, and the agent-action log.
//!
//! [`EventFeedStore`] owns the three collections and every rule about how
//! they change:
//!
//! - Messages are append-only; insertion order is display order. An
//!   optional cap drops the oldest entries.
//! - The action log is newest-first and bounded; inserting past the bound
//!   discards the oldest entry.
//! - A member's warning count only ever goes up, and only via
//!   [`EventFeedStore::warn_member`]. Admins and unknown IDs are silent
//!   no-ops.
//!
//! Every mutation is published as a [`FeedEvent`] on a broadcast channel
//! so the observer can stream changes without polling.

use std::sync::Arc;

use guild_types::{
    ActionId, ActionKind, ActionStatus, AgentAction, AgentStatus, ChatMessage, FeedEvent,
    FeedSnapshot, GroupStats, Member, MemberId, MessageId, MessageKind,
};
use serde::Serialize;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;

use crate::catalog::{self, ACTION_TEMPLATES, CANNED_REPLIES};
use crate::clock::Clock;
use crate::config::GuildConfig;
use crate::random::RandomSource;
use crate::seed::{self, SeedError};

/// Capacity of the feed event broadcast channel.
///
/// A subscriber that falls behind by more than this many events receives
/// [`broadcast::error::RecvError::Lagged`] and skips ahead.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A store shared between the runtime tasks and the observer.
pub type SharedFeed = Arc<RwLock<EventFeedStore>>;

/// Names, bounds, and probabilities the store applies.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSettings {
    /// Sender name for agent messages.
    pub agent_name: String,
    /// Sender name for user messages.
    pub user_name: String,
    /// Sender name for system notices.
    pub system_name: String,
    /// Maximum retained action-log entries.
    pub action_log_capacity: usize,
    /// Optional cap on retained messages.
    pub max_messages: Option<usize>,
    /// Number of actions in the activity view.
    pub activity_view_len: usize,
    /// Chance that a periodic tick records an action.
    pub activity_probability: f64,
    /// Members below this warning count are active.
    pub active_warning_threshold: u32,
}

impl FeedSettings {
    /// Derive settings from the loaded configuration.
    pub fn from_config(config: &GuildConfig) -> Self {
        Self {
            agent_name: config.agent.name.clone(),
            user_name: config.agent.user_name.clone(),
            system_name: config.agent.system_name.clone(),
            action_log_capacity: config.feed.action_log_capacity,
            max_messages: config.feed.max_messages,
            activity_view_len: config.feed.activity_view_len,
            activity_probability: config.agent.activity_probability,
            active_warning_threshold: config.feed.active_warning_threshold,
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self::from_config(&GuildConfig::default())
    }
}

/// What [`EventFeedStore::warn_member`] did.
///
/// The store never fails a warning; callers that only care about the
/// side effects can ignore this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WarnOutcome {
    /// The member's warning count was incremented.
    Warned {
        /// The warned member.
        member_id: MemberId,
        /// Warning count after the increment.
        warning_count: u32,
    },
    /// The member is an admin; nothing changed.
    AdminExempt {
        /// The admin that was targeted.
        member_id: MemberId,
    },
    /// No member has this ID; nothing changed.
    UnknownMember {
        /// The unresolved ID.
        member_id: MemberId,
    },
}

/// In-memory store for the chat, member list, and action log.
pub struct EventFeedStore {
    settings: FeedSettings,
    clock: Arc<dyn Clock>,
    messages: Vec<ChatMessage>,
    members: Vec<Member>,
    actions: Vec<AgentAction>,
    agent_status: AgentStatus,
    events: broadcast::Sender<FeedEvent>,
}

impl core::fmt::Debug for EventFeedStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventFeedStore")
            .field("settings", &self.settings)
            .field("messages", &self.messages.len())
            .field("members", &self.members.len())
            .field("actions", &self.actions.len())
            .field("agent_status", &self.agent_status)
            .finish_non_exhaustive()
    }
}

impl EventFeedStore {
    /// Create an empty store. The agent starts idle.
    pub fn new(settings: FeedSettings, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            settings,
            clock,
            messages: Vec::new(),
            members: Vec::new(),
            actions: Vec::new(),
            agent_status: AgentStatus::Idle,
            events,
        }
    }

    /// Create a store holding the fixed seed dataset.
    ///
    /// # Errors
    ///
    /// Returns [`SeedError`] if the seed dataset cannot be built.
    pub fn seeded(settings: FeedSettings, clock: Arc<dyn Clock>) -> Result<Self, SeedError> {
        let seed = seed::seed_state(clock.now(), &settings.agent_name)?;
        let mut store = Self::new(settings, clock);
        store.messages = seed.messages;
        store.members = seed.members;
        store.actions = seed.actions;
        store.actions.truncate(store.settings.action_log_capacity);
        store.trim_messages();
        Ok(store)
    }

    /// Wrap the store for sharing across tasks.
    pub fn into_shared(self) -> SharedFeed {
        Arc::new(RwLock::new(self))
    }

    /// The settings this store applies.
    pub const fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Subscribe to change notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events.subscribe()
    }

    // -----------------------------------------------------------------------
    // Messages
    // -----------------------------------------------------------------------

    /// Append a message with a fresh ID and the current timestamp.
    pub fn append_message(
        &mut self,
        sender: impl Into<String>,
        content: impl Into<String>,
        kind: MessageKind,
    ) -> MessageId {
        let message = ChatMessage {
            id: MessageId::new(),
            sender: sender.into(),
            content: content.into(),
            timestamp: self.clock.now(),
            kind,
        };
        let id = message.id;
        debug!(message_id = %id, ?kind, sender = %message.sender, "Message appended");
        self.messages.push(message.clone());
        self.trim_messages();
        self.publish(FeedEvent::MessageAppended(message));
        id
    }

    /// Append a message typed by the dashboard user.
    ///
    /// Input that is empty after trimming is rejected and nothing is
    /// appended. Accepted input is stored as typed.
    pub fn send_user_message(&mut self, content: &str) -> Option<MessageId> {
        if content.trim().is_empty() {
            debug!("Ignoring empty user message");
            return None;
        }
        let sender = self.settings.user_name.clone();
        Some(self.append_message(sender, content, MessageKind::User))
    }

    fn trim_messages(&mut self) {
        if let Some(cap) = self.settings.max_messages {
            let excess = self.messages.len().saturating_sub(cap);
            if excess > 0 {
                self.messages.drain(..excess);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// Issue a warning to a member.
    ///
    /// For a regular member this increments the warning count, logs a
    /// `warning_issued` action, and posts a system notice naming the
    /// member. Admins and unknown IDs leave all state untouched.
    pub fn warn_member(&mut self, member_id: MemberId) -> WarnOutcome {
        let Some(member) = self.members.iter_mut().find(|m| m.id == member_id) else {
            debug!(%member_id, "Warn ignored: unknown member");
            return WarnOutcome::UnknownMember { member_id };
        };

        if !member.is_warnable() {
            debug!(%member_id, name = %member.name, "Warn ignored: admin");
            return WarnOutcome::AdminExempt { member_id };
        }

        member.warning_count = member.warning_count.saturating_add(1);
        let updated = member.clone();
        debug!(
            %member_id,
            name = %updated.name,
            warning_count = updated.warning_count,
            "Member warned"
        );
        self.publish(FeedEvent::MemberUpdated(updated.clone()));

        self.record_agent_action(
            ActionKind::WarningIssued,
            catalog::warning_action_description(&updated.name),
            ActionStatus::Success,
        );

        let notice = catalog::warning_notice(&self.settings.agent_name, &updated.name);
        let sender = self.settings.system_name.clone();
        self.append_message(sender, notice, MessageKind::System);

        WarnOutcome::Warned {
            member_id,
            warning_count: updated.warning_count,
        }
    }

    // -----------------------------------------------------------------------
    // Action log
    // -----------------------------------------------------------------------

    /// Prepend an action to the log and drop entries past the capacity.
    pub fn record_agent_action(
        &mut self,
        kind: ActionKind,
        description: impl Into<String>,
        status: ActionStatus,
    ) -> ActionId {
        let action = AgentAction {
            id: ActionId::new(),
            kind,
            description: description.into(),
            timestamp: self.clock.now(),
            status,
        };
        let id = action.id;
        debug!(action_id = %id, %kind, ?status, "Agent action recorded");
        self.actions.insert(0, action.clone());
        self.actions.truncate(self.settings.action_log_capacity);
        self.publish(FeedEvent::ActionRecorded(action));
        id
    }

    // -----------------------------------------------------------------------
    // Simulated agent
    // -----------------------------------------------------------------------

    /// Run one periodic activity tick.
    ///
    /// Draws a roll and records an action only when the roll falls below
    /// the configured probability. The template is picked uniformly.
    /// Returns the recorded action's ID, or `None` when the tick is skipped.
    pub fn generate_random_action(&mut self, rng: &mut dyn RandomSource) -> Option<ActionId> {
        let roll = rng.roll();
        if roll >= self.settings.activity_probability {
            return None;
        }
        let template = ACTION_TEMPLATES.get(rng.pick(ACTION_TEMPLATES.len()))?;
        Some(self.record_agent_action(
            template.kind,
            template.description,
            ActionStatus::Success,
        ))
    }

    /// Append an agent reply picked uniformly from the canned replies.
    ///
    /// `user_text` is never inspected.
    pub fn generate_agent_reply(
        &mut self,
        user_text: &str,
        rng: &mut dyn RandomSource,
    ) -> MessageId {
        let reply = CANNED_REPLIES
            .get(rng.pick(CANNED_REPLIES.len()))
            .copied()
            .unwrap_or_default();
        debug!(prompt_len = user_text.len(), "Generating canned agent reply");
        let sender = self.settings.agent_name.clone();
        self.append_message(sender, reply, MessageKind::Agent)
    }

    /// Update the header activity flag. Publishes only on change.
    pub fn set_agent_status(&mut self, status: AgentStatus) {
        if self.agent_status != status {
            self.agent_status = status;
            debug!(?status, "Agent status changed");
            self.publish(FeedEvent::AgentStatusChanged(status));
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Chat messages, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Members in display order.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Look up a single member.
    pub fn member(&self, member_id: MemberId) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    /// The action log, newest first.
    pub fn actions(&self) -> &[AgentAction] {
        &self.actions
    }

    /// The `limit` newest actions.
    pub fn recent_actions(&self, limit: usize) -> &[AgentAction] {
        let end = limit.min(self.actions.len());
        self.actions.get(..end).unwrap_or_default()
    }

    /// The actions shown in the dashboard's activity panel.
    pub fn activity_view(&self) -> &[AgentAction] {
        self.recent_actions(self.settings.activity_view_len)
    }

    /// Current header activity flag.
    pub const fn agent_status(&self) -> AgentStatus {
        self.agent_status
    }

    /// Derived counters for the stats grid.
    pub fn stats(&self) -> GroupStats {
        let threshold = self.settings.active_warning_threshold;
        GroupStats {
            total_members: saturating_u32(self.members.len()),
            active_members: saturating_u32(
                self.members
                    .iter()
                    .filter(|m| m.warning_count < threshold)
                    .count(),
            ),
            total_warnings: self
                .members
                .iter()
                .fold(0_u32, |sum, m| sum.saturating_add(m.warning_count)),
            agent_actions: saturating_u32(self.actions.len()),
        }
    }

    /// Clone the full state into a serializable snapshot.
    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            messages: self.messages.clone(),
            members: self.members.clone(),
            actions: self.actions.clone(),
            agent_status: self.agent_status,
            stats: self.stats(),
        }
    }

    fn publish(&self, event: FeedEvent) {
        // Err only means nobody is subscribed.
        let _ = self.events.send(event);
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use chrono::{DateTime, TimeDelta, Utc};
    use guild_types::MemberRole;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::clock::ManualClock;
    use crate::random::ScriptedRandom;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_720_000_000, 0).unwrap()
    }

    fn seeded_store() -> (EventFeedStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let store = EventFeedStore::seeded(FeedSettings::default(), clock.clone()).unwrap();
        (store, clock)
    }

    fn warning_counts(store: &EventFeedStore) -> Vec<(MemberId, u32)> {
        store
            .members()
            .iter()
            .map(|m| (m.id, m.warning_count))
            .collect()
    }

    #[test]
    fn seeded_store_matches_seed_dataset() {
        let (store, _) = seeded_store();
        assert_eq!(store.members().len(), 5);
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.actions().len(), 3);
        assert_eq!(store.agent_status(), AgentStatus::Idle);
    }

    #[test]
    fn append_message_adds_exactly_one_at_end() {
        let (mut store, clock) = seeded_store();
        clock.advance(TimeDelta::seconds(30));
        let before = store.messages().len();

        let id = store.append_message("You", "hello", MessageKind::User);

        assert_eq!(store.messages().len(), before + 1);
        let last = store.messages().last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.sender, "You");
        assert_eq!(last.content, "hello");
        assert_eq!(last.kind, MessageKind::User);
        assert_eq!(last.timestamp, start() + TimeDelta::seconds(30));
    }

    #[test]
    fn message_cap_drops_oldest() {
        let clock = Arc::new(ManualClock::new(start()));
        let settings = FeedSettings {
            max_messages: Some(3),
            ..FeedSettings::default()
        };
        let mut store = EventFeedStore::new(settings, clock);
        for i in 0..5 {
            store.append_message("You", format!("m{i}"), MessageKind::User);
        }
        let contents: Vec<&str> = store.messages().iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3", "m4"]);
    }

    #[test]
    fn empty_user_message_is_rejected() {
        let (mut store, _) = seeded_store();
        assert!(store.send_user_message("").is_none());
        assert!(store.send_user_message("   \t").is_none());
        assert_eq!(store.messages().len(), 1);

        let id = store.send_user_message("  hi  ").unwrap();
        let last = store.messages().last().unwrap();
        assert_eq!(last.id, id);
        assert_eq!(last.sender, "You");
        assert_eq!(last.content, "  hi  ");
    }

    #[test]
    fn warn_member_increments_only_target() {
        let (mut store, _) = seeded_store();
        let target = MemberId::from_u128(2);
        let before = warning_counts(&store);

        let outcome = store.warn_member(target);

        assert_eq!(
            outcome,
            WarnOutcome::Warned {
                member_id: target,
                warning_count: 1
            }
        );
        for ((id, old), (_, new)) in before.iter().zip(warning_counts(&store)) {
            if *id == target {
                assert_eq!(new, old + 1);
            } else {
                assert_eq!(new, *old);
            }
        }
    }

    #[test]
    fn warn_amit_patel_scenario() {
        let (mut store, _) = seeded_store();
        let messages_before = store.messages().len();

        store.warn_member(MemberId::from_u128(3));

        let amit = store.member(MemberId::from_u128(3)).unwrap();
        assert_eq!(amit.name, "Amit Patel");
        assert_eq!(amit.warning_count, 2);

        let newest = &store.actions()[0];
        assert_eq!(newest.kind, ActionKind::WarningIssued);
        assert_eq!(newest.description, "Warning issued to Amit Patel");
        assert_eq!(newest.status, ActionStatus::Success);

        assert_eq!(store.messages().len(), messages_before + 1);
        let notice = store.messages().last().unwrap();
        assert_eq!(notice.kind, MessageKind::System);
        assert_eq!(notice.sender, "System");
        assert!(notice.content.contains("Amit Patel"));
    }

    #[test]
    fn warn_admin_is_noop() {
        let (mut store, _) = seeded_store();
        let admin = store
            .members()
            .iter()
            .find(|m| m.role == MemberRole::Admin)
            .map(|m| m.id)
            .unwrap();
        let before = store.snapshot();

        let outcome = store.warn_member(admin);

        assert_eq!(outcome, WarnOutcome::AdminExempt { member_id: admin });
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn warn_unknown_is_noop() {
        let (mut store, _) = seeded_store();
        let before = store.snapshot();
        let ghost = MemberId::new();

        let outcome = store.warn_member(ghost);

        assert_eq!(outcome, WarnOutcome::UnknownMember { member_id: ghost });
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn warning_count_never_decreases() {
        let (mut store, _) = seeded_store();
        let target = MemberId::from_u128(5);
        let mut last = store.member(target).unwrap().warning_count;
        for _ in 0..20 {
            store.warn_member(target);
            let now = store.member(target).unwrap().warning_count;
            assert!(now > last);
            last = now;
        }
    }

    #[test]
    fn record_action_inserts_at_front_and_bounds_log() {
        let (mut store, _) = seeded_store();
        for i in 0..25 {
            let id = store.record_agent_action(
                ActionKind::SpamPrevention,
                format!("action {i}"),
                ActionStatus::Pending,
            );
            assert_eq!(store.actions()[0].id, id);
            assert!(store.actions().len() <= 10);
        }
        assert_eq!(store.actions().len(), 10);
        assert_eq!(store.actions()[0].description, "action 24");
        assert_eq!(store.actions()[9].description, "action 15");
    }

    #[test]
    fn warnings_respect_log_bound() {
        let (mut store, _) = seeded_store();
        for _ in 0..15 {
            store.warn_member(MemberId::from_u128(4));
        }
        assert_eq!(store.actions().len(), 10);
        assert!(
            store
                .actions()
                .iter()
                .all(|a| a.kind == ActionKind::WarningIssued)
        );
    }

    #[test]
    fn random_action_respects_gate() {
        let (mut store, _) = seeded_store();
        // 0.7 is above the 0.3 gate: skipped. 0.29 passes and picks template 2.
        let mut rng = ScriptedRandom::new().with_rolls([0.7, 0.29]).with_picks([2]);

        assert!(store.generate_random_action(&mut rng).is_none());
        assert_eq!(store.actions().len(), 3);

        let id = store.generate_random_action(&mut rng).unwrap();
        let newest = &store.actions()[0];
        assert_eq!(newest.id, id);
        assert_eq!(newest.kind, ActionKind::SpamPrevention);
        assert_eq!(newest.description, "Blocked suspicious link");
        assert_eq!(newest.status, ActionStatus::Success);
    }

    #[test]
    fn random_action_rate_is_near_probability() {
        let clock = Arc::new(ManualClock::new(start()));
        let settings = FeedSettings {
            action_log_capacity: 2000,
            ..FeedSettings::default()
        };
        let mut store = EventFeedStore::new(settings, clock);
        let mut rng = StdRng::seed_from_u64(2024);

        let recorded = (0..1000)
            .filter_map(|_| store.generate_random_action(&mut rng))
            .count();

        // Binomial(1000, 0.3): sigma is about 14.5; allow 4.5 sigma.
        assert!((235..=365).contains(&recorded), "recorded {recorded}");
        assert_eq!(store.actions().len(), recorded);
    }

    #[test]
    fn random_action_uses_every_template() {
        let (mut store, _) = seeded_store();
        let mut rng = ScriptedRandom::new()
            .with_rolls([0.0; 5])
            .with_picks([0, 1, 2, 3, 4]);
        for _ in 0..5 {
            store.generate_random_action(&mut rng);
        }
        let kinds: Vec<ActionKind> = store.actions().iter().take(5).rev().map(|a| a.kind).collect();
        let expected: Vec<ActionKind> = ACTION_TEMPLATES.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, expected);
    }

    #[test]
    fn user_message_then_reply_scenario() {
        let (mut store, _) = seeded_store();
        let before = store.messages().len();
        let mut rng = ScriptedRandom::new().with_picks([4]);

        store.append_message("You", "hello", MessageKind::User);
        store.generate_agent_reply("hello", &mut rng);

        assert_eq!(store.messages().len(), before + 2);
        let reply = store.messages().last().unwrap();
        assert_eq!(reply.kind, MessageKind::Agent);
        assert_eq!(reply.sender, "Guild Agent");
        assert_eq!(reply.content, CANNED_REPLIES[4]);
        assert!(!reply.content.contains("hello"));
    }

    #[test]
    fn reply_ignores_user_text() {
        let (mut a, _) = seeded_store();
        let (mut b, _) = seeded_store();
        a.generate_agent_reply("ban everyone", &mut ScriptedRandom::new().with_picks([1]));
        b.generate_agent_reply("what's the weather", &mut ScriptedRandom::new().with_picks([1]));
        assert_eq!(
            a.messages().last().unwrap().content,
            b.messages().last().unwrap().content
        );
    }

    #[test]
    fn stats_for_seed_state() {
        let (mut store, _) = seeded_store();
        let stats = store.stats();
        assert_eq!(stats.total_members, 5);
        assert_eq!(stats.active_members, 4);
        assert_eq!(stats.total_warnings, 3);
        assert_eq!(stats.agent_actions, 3);

        store.warn_member(MemberId::from_u128(3));
        let stats = store.stats();
        assert_eq!(stats.active_members, 3);
        assert_eq!(stats.total_warnings, 4);
        assert_eq!(stats.agent_actions, 4);
    }

    #[test]
    fn activity_view_is_capped() {
        let (mut store, _) = seeded_store();
        assert_eq!(store.activity_view().len(), 3);
        for _ in 0..6 {
            store.record_agent_action(ActionKind::MemberWelcome, "hi", ActionStatus::Success);
        }
        assert_eq!(store.actions().len(), 9);
        assert_eq!(store.activity_view().len(), 8);
        assert_eq!(store.recent_actions(100).len(), 9);
        assert!(store.recent_actions(0).is_empty());
    }

    #[test]
    fn mutations_are_published() {
        let (mut store, _) = seeded_store();
        let mut rx = store.subscribe();

        store.warn_member(MemberId::from_u128(2));
        store.set_agent_status(AgentStatus::Active);
        store.set_agent_status(AgentStatus::Active);

        assert!(matches!(rx.try_recv(), Ok(FeedEvent::MemberUpdated(m)) if m.warning_count == 1));
        assert!(matches!(
            rx.try_recv(),
            Ok(FeedEvent::ActionRecorded(a)) if a.kind == ActionKind::WarningIssued
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(FeedEvent::MessageAppended(m)) if m.kind == MessageKind::System
        ));
        assert!(matches!(
            rx.try_recv(),
            Ok(FeedEvent::AgentStatusChanged(AgentStatus::Active))
        ));
        // Setting the same status twice publishes once.
        assert!(rx.try_recv().is_err());
    }
}
