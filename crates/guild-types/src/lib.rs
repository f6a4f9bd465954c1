//! Shared type definitions for the Guild Manager event feed.
//!
//! This crate is the single source of truth for the records the feed store
//! holds and the views it serves. Types flow to `TypeScript` via `ts-rs` for
//! the dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for message, member, and action IDs
//! - [`enums`] -- Message kinds, member roles, action kinds and statuses
//! - [`structs`] -- Feed records, stats, snapshot, and change events

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ActionKind, ActionStatus, AgentStatus, MemberRole, MessageKind};
pub use ids::{ActionId, MemberId, MessageId};
pub use structs::{AgentAction, ChatMessage, FeedEvent, FeedSnapshot, GroupStats, Member};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the dashboard.

    #[test]
    fn export_bindings() {
        // Writes .ts files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::MessageId::export_all();
        let _ = crate::ids::MemberId::export_all();
        let _ = crate::ids::ActionId::export_all();

        // Enums
        let _ = crate::enums::MessageKind::export_all();
        let _ = crate::enums::MemberRole::export_all();
        let _ = crate::enums::ActionKind::export_all();
        let _ = crate::enums::ActionStatus::export_all();
        let _ = crate::enums::AgentStatus::export_all();

        // Structs
        let _ = crate::structs::ChatMessage::export_all();
        let _ = crate::structs::Member::export_all();
        let _ = crate::structs::AgentAction::export_all();
        let _ = crate::structs::GroupStats::export_all();
        let _ = crate::structs::FeedSnapshot::export_all();
        let _ = crate::structs::FeedEvent::export_all();
    }
}
