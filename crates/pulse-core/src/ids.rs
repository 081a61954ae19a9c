//! Numeric ID newtypes.
//!
//! The backend keys conversations and messages by integer, and the client
//! hands out its own monotonic sequence numbers for notifications and
//! subscribers. Each gets a distinct type so a notification id can't be
//! passed where a conversation id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw value.
            #[must_use]
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// The raw value.
            #[must_use]
            pub const fn get(self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }
    };
}

numeric_id! {
    /// Server-side identifier of a chat conversation.
    ConversationId(i64)
}

numeric_id! {
    /// Sequence number of an entry in the notification history.
    NotificationId(u64)
}

numeric_id! {
    /// Identity of one registered router callback.
    SubscriberId(u64)
}
