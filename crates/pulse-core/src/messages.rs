//! Chat transcript messages.
//!
//! Messages confirmed by the server carry the backend's integer id. A
//! message the client shows before confirmation carries a provisional
//! `temp-<uuid>` id and `pending = true`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a transcript message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    /// Server-assigned id.
    Confirmed(i64),
    /// Client-side placeholder id.
    Provisional(String),
}

impl MessageId {
    /// Fresh provisional id (UUID v7, time-ordered).
    #[must_use]
    pub fn provisional() -> Self {
        Self::Provisional(format!("temp-{}", Uuid::now_v7()))
    }

    /// Whether this is a client-side placeholder.
    pub fn is_provisional(&self) -> bool {
        matches!(self, Self::Provisional(_))
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Confirmed(id) => write!(f, "{id}"),
            Self::Provisional(id) => f.write_str(id),
        }
    }
}

/// Author of a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human.
    User,
    /// The model.
    Assistant,
}

/// One transcript entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message identity.
    pub id: MessageId,
    /// Author.
    pub role: Role,
    /// Text content.
    pub content: String,
    /// Prompt tokens billed for the reply (assistant messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    /// Completion tokens billed for the reply (assistant messages only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    /// Server creation time, as sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Shown before the server confirmed it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl ChatMessage {
    /// A pending user message with a provisional id.
    pub fn provisional(content: impl Into<String>) -> Self {
        Self {
            id: MessageId::provisional(),
            role: Role::User,
            content: content.into(),
            input_tokens: None,
            output_tokens: None,
            created_at: None,
            pending: true,
        }
    }

    /// A confirmed message.
    pub fn confirmed(id: i64, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::Confirmed(id),
            role,
            content: content.into(),
            input_tokens: None,
            output_tokens: None,
            created_at: None,
            pending: false,
        }
    }

    /// Attach token usage as reported by the server.
    #[must_use]
    pub fn with_usage(mut self, input_tokens: Option<u32>, output_tokens: Option<u32>) -> Self {
        self.input_tokens = input_tokens;
        self.output_tokens = output_tokens;
        self
    }
}

/// The user/assistant pair a completed exchange produces.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePair {
    /// Confirmed user message.
    pub user_message: ChatMessage,
    /// Assistant reply.
    pub assistant_message: ChatMessage,
}
