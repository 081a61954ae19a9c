//! # pulse-core
//!
//! Shared vocabulary for the Pulse real-time layer.
//!
//! - **Events**: [`EventKind`] tagged union, [`ServerEvent`] envelope, typed payloads
//! - **Messages**: [`ChatMessage`] with confirmed/provisional [`MessageId`]s
//! - **IDs**: numeric newtypes for conversations, notifications, subscribers
//! - **Status**: [`ConnectionStatus`] of the long-lived channel
//! - **Logging**: [`logging::init_subscriber`] for binaries

#![deny(unsafe_code)]

pub mod events;
pub mod ids;
pub mod logging;
pub mod messages;
pub mod status;

pub use events::{
    ChatStreamChunk, ClientMessage, EventKind, ImportProgress, NotificationLevel,
    NotificationPayload, ScriptOutput, ScriptStatus, ServerEvent,
};
pub use ids::{ConversationId, NotificationId, SubscriberId};
pub use messages::{ChatMessage, MessageId, MessagePair, Role};
pub use status::ConnectionStatus;
