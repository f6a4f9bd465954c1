//! Fixed text catalogs used by the simulated agent.
//!
//! Nothing here reacts to input. The generator picks uniformly from these
//! tables; the warning texts are formatted with a member-name snapshot.

use guild_types::ActionKind;

/// A template the periodic activity task can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionTemplate {
    /// Category tag of the recorded action.
    pub kind: ActionKind,
    /// Description stored on the recorded action.
    pub description: &'static str,
}

/// Templates drawn by the periodic activity task.
pub const ACTION_TEMPLATES: [ActionTemplate; 5] = [
    ActionTemplate {
        kind: ActionKind::AutoModeration,
        description: "Automatically moderated excessive messages",
    },
    ActionTemplate {
        kind: ActionKind::MemberWelcome,
        description: "Welcomed new member to the group",
    },
    ActionTemplate {
        kind: ActionKind::SpamPrevention,
        description: "Blocked suspicious link",
    },
    ActionTemplate {
        kind: ActionKind::ActivitySummary,
        description: "Generated daily activity report",
    },
    ActionTemplate {
        kind: ActionKind::RuleEnforcement,
        description: "Reminded members about group rules",
    },
];

/// Replies the agent sends after a user message, regardless of its content.
pub const CANNED_REPLIES: [&str; 6] = [
    "Main aapki request process kar raha hoon. Group rules update ho gaye hain.",
    "Samajh gaya! Main automatically handle kar loonga ye task.",
    "Done! Maine spam filter ko update kar diya hai.",
    "Good idea! Main immediately implement kar raha hoon.",
    "Group security settings update ho gayi hain. Sab secure hai.",
    "Main group activity ko monitor kar raha hoon. Sab theek chal raha hai.",
];

/// The agent's greeting, seeded as the first chat message.
pub const WELCOME_MESSAGE: &str = "Namaste! Main aapke WhatsApp group ka Guild Manager hoon. \
Main automatically spam detect karta hoon, rules enforce karta hoon, aur group ko organize rakhta hoon.";

/// Description of the action logged when a member is warned.
pub fn warning_action_description(member_name: &str) -> String {
    format!("Warning issued to {member_name}")
}

/// Content of the system message posted when a member is warned.
pub fn warning_notice(agent_name: &str, member_name: &str) -> String {
    format!("\u{26a0}\u{fe0f} {agent_name} ne {member_name} ko warning di hai.")
}

/// Whether `text` is one of the [`CANNED_REPLIES`].
pub fn is_canned_reply(text: &str) -> bool {
    CANNED_REPLIES.contains(&text)
}
