//! Lifecycle status of the long-lived event channel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Observable state of the connection manager.
///
/// `Failed` is terminal for automatic recovery: it is only left through an
/// explicit `connect()` or `reconnect()`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// No channel and no pending attempt.
    #[default]
    Disconnected,
    /// A channel is being opened.
    Connecting,
    /// The channel is open.
    Connected,
    /// The channel closed; a retry is scheduled.
    Reconnecting,
    /// The retry budget is exhausted.
    Failed,
}

impl ConnectionStatus {
    /// Wire/display name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Failed => "failed",
        }
    }

    /// Whether a channel is currently open.
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
