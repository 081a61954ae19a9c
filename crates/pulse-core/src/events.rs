//! Wire envelopes for the long-lived event channel.
//!
//! Every inbound frame is `{"type": <kind>, "data": <payload>}` (the server
//! also stamps a `timestamp`). The kind is decoded into [`EventKind`]; the
//! payload stays an opaque [`Value`] until a subscriber asks for a typed view
//! via [`ServerEvent::payload`].

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

// ─────────────────────────────────────────────────────────────────────────────
// EventKind
// ─────────────────────────────────────────────────────────────────────────────

/// Discriminator of an inbound event.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// `script.output`: A chunk of script stdout/stderr.
    ScriptOutput,
    /// `script.status`: Script lifecycle change.
    ScriptStatus,
    /// `chat.stream`: Broadcast chat token.
    ChatStream,
    /// `notification`: User-facing notification, recorded in history.
    Notification,
    /// `pst_import.progress`: Mailbox import progress.
    PstImportProgress,
    /// `pong`: Keep-alive reply.
    Pong,
    /// `subscribed`: Channel subscription acknowledgement.
    Subscribed,
    /// Any kind this client has no name for.
    Other(String),
}

impl EventKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::ScriptOutput => "script.output",
            Self::ScriptStatus => "script.status",
            Self::ChatStream => "chat.stream",
            Self::Notification => "notification",
            Self::PstImportProgress => "pst_import.progress",
            Self::Pong => "pong",
            Self::Subscribed => "subscribed",
            Self::Other(name) => name.as_str(),
        }
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        match name {
            "script.output" => Self::ScriptOutput,
            "script.status" => Self::ScriptStatus,
            "chat.stream" => Self::ChatStream,
            "notification" => Self::Notification,
            "pst_import.progress" => Self::PstImportProgress,
            "pong" => Self::Pong,
            "subscribed" => Self::Subscribed,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        match Self::from(name.as_str()) {
            Self::Other(_) => Self::Other(name),
            known => known,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ServerEvent
// ─────────────────────────────────────────────────────────────────────────────

/// A decoded `{"type", "data"}` envelope.
///
/// Any other top-level fields the server sends (for example the `channel`
/// of a `subscribed` reply) are kept in [`extra`](Self::extra) and written
/// back out on serialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    /// Event discriminator.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Opaque payload (`null` when absent).
    #[serde(default)]
    pub data: Value,
    /// Server-side emission time, if stamped. String or epoch number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    /// Remaining top-level fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerEvent {
    /// Build an envelope.
    pub fn new(kind: impl Into<EventKind>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            timestamp: None,
            extra: Map::new(),
        }
    }

    /// A top-level field outside `type`, `data` and `timestamp`.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Decode a raw text frame. Returns `None` for anything that is not a
    /// JSON object with a string `type`.
    pub fn decode(raw: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(raw).ok()?;
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value).ok()
    }

    /// Deserialize the payload into a typed view.
    pub fn payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        T::deserialize(&self.data)
    }

    /// Notification fields, if this is a notification carrying data.
    pub fn notification(&self) -> Option<NotificationPayload> {
        if self.kind != EventKind::Notification || is_falsy(&self.data) {
            return None;
        }
        Some(NotificationPayload::from_data(&self.data))
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outbound
// ─────────────────────────────────────────────────────────────────────────────

/// Control frames the client sends on the long-lived channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Keep-alive.
    Ping,
    /// Ask the server to scope pushes to a named channel.
    Subscribe {
        /// Channel name.
        channel: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Payloads
// ─────────────────────────────────────────────────────────────────────────────

/// Severity of a notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Neutral information.
    #[default]
    Info,
    /// Something finished well.
    Success,
    /// Needs attention.
    Warning,
    /// Something failed.
    Error,
}

impl NotificationLevel {
    /// Parse a wire level; unknown values yield `None`.
    pub fn parse(level: &str) -> Option<Self> {
        match level {
            "info" => Some(Self::Info),
            "success" => Some(Self::Success),
            "warning" => Some(Self::Warning),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Fields of a `notification` event.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    /// Body text.
    pub message: String,
    /// Severity (defaults to info).
    #[serde(default)]
    pub level: NotificationLevel,
    /// Optional heading.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional link to navigate to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl NotificationPayload {
    /// Build a payload with just a message and level.
    pub fn new(message: impl Into<String>, level: NotificationLevel) -> Self {
        Self {
            message: message.into(),
            level,
            title: None,
            action_url: None,
        }
    }

    /// Lenient extraction from an event payload.
    ///
    /// Never fails: missing or mistyped fields fall back to empty/absent and
    /// an unknown level falls back to info, so every notification frame
    /// yields exactly one history entry.
    pub fn from_data(data: &Value) -> Self {
        let text = |key: &str| data.get(key).and_then(Value::as_str).map(str::to_owned);
        let message = match data {
            Value::String(s) => s.clone(),
            _ => text("message").unwrap_or_default(),
        };
        Self {
            message,
            level: data
                .get("level")
                .and_then(Value::as_str)
                .and_then(NotificationLevel::parse)
                .unwrap_or_default(),
            title: text("title"),
            action_url: text("action_url"),
        }
    }
}

/// `script.output` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptOutput {
    /// Script being run.
    pub script_id: i64,
    /// Output chunk.
    pub output: String,
    /// Whether the chunk came from stderr.
    #[serde(default)]
    pub is_error: bool,
}

/// `script.status` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStatus {
    /// Script being run.
    pub script_id: i64,
    /// `running`, `completed`, `failed`, ...
    pub status: String,
    /// Process exit code once finished.
    #[serde(default)]
    pub exit_code: Option<i32>,
}

/// `chat.stream` payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    /// Conversation the token belongs to.
    pub conversation_id: i64,
    /// Token text.
    #[serde(default)]
    pub token: String,
    /// Whether this is the last chunk.
    #[serde(default)]
    pub done: bool,
}

/// `pst_import.progress` payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImportProgress {
    /// Import job identifier.
    pub import_id: String,
    /// Items processed so far.
    pub progress: u64,
    /// Total items.
    pub total: u64,
    /// Item currently being processed.
    #[serde(default)]
    pub current_item: Option<String>,
    /// Job state.
    #[serde(default)]
    pub status: String,
    /// Server-computed completion percentage.
    #[serde(default)]
    pub percentage: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
