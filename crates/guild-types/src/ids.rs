//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every record in the feed has a strongly-typed ID so a message ID can
//! never be passed where a member ID is expected. Fresh IDs use UUID v7
//! (time-ordered). Seed records use small fixed values built with
//! `from_u128` so they are addressable deterministically.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Create a fixed identifier from an integer (seed data).
            pub const fn from_u128(value: u128) -> Self {
                Self(Uuid::from_u128(value))
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a chat message.
    MessageId
}

define_id! {
    /// Unique identifier for a group member.
    MemberId
}

define_id! {
    /// Unique identifier for an entry in the agent-action log.
    ActionId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_unique() {
        let a = MessageId::new();
        let b = MessageId::new();
        assert_ne!(a, b);
        assert_ne!(a.into_inner(), Uuid::nil());
    }

    #[test]
    fn seed_ids_are_stable() {
        assert_eq!(MemberId::from_u128(3), MemberId::from_u128(3));
        assert_eq!(
            MemberId::from_u128(3).to_string(),
            "00000000-0000-0000-0000-000000000003"
        );
    }

    #[test]
    fn id_serializes_as_plain_uuid() {
        let id = ActionId::from_u128(1);
        let json = serde_json::to_string(&id).ok();
        assert_eq!(
            json.as_deref(),
            Some("\"00000000-0000-0000-0000-000000000001\"")
        );
    }
}
