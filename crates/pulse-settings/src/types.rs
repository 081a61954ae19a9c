//! Settings schema.
//!
//! Every struct uses `#[serde(default)]` so a partial file only overrides
//! the keys it names.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PulseSettings {
    /// Long-lived channel behaviour.
    pub connection: ConnectionSettings,
    /// Notification history and side channels.
    pub notifications: NotificationSettings,
    /// Streaming chat.
    pub chat: ChatSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl PulseSettings {
    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<()> {
        let origin = Url::parse(&self.connection.origin).map_err(|e| {
            SettingsError::InvalidValue(format!(
                "connection.origin {:?}: {e}",
                self.connection.origin
            ))
        })?;
        if !matches!(origin.scheme(), "http" | "https") {
            return Err(SettingsError::InvalidValue(format!(
                "connection.origin must be http or https, got {}",
                origin.scheme()
            )));
        }
        let nonzero = [
            ("connection.reconnect_interval_ms", self.connection.reconnect_interval_ms),
            ("connection.keepalive_interval_ms", self.connection.keepalive_interval_ms),
            ("chat.stream_idle_timeout_ms", self.chat.stream_idle_timeout_ms),
            ("chat.request_timeout_ms", self.chat.request_timeout_ms),
        ];
        for (key, value) in nonzero {
            if value == 0 {
                return Err(SettingsError::InvalidValue(format!("{key} must be > 0")));
            }
        }
        if self.connection.channel_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "connection.channel_capacity must be > 0".into(),
            ));
        }
        if self.notifications.max_entries == 0 {
            return Err(SettingsError::InvalidValue(
                "notifications.max_entries must be > 0".into(),
            ));
        }
        Ok(())
    }
}

/// Connection manager settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Page origin the channel URLs are derived from (`http(s)://host[:port]`).
    pub origin: String,
    /// Constant delay between automatic reconnect attempts.
    pub reconnect_interval_ms: u64,
    /// Automatic attempts before giving up.
    pub max_reconnect_attempts: u32,
    /// Keep-alive ping period while connected.
    pub keepalive_interval_ms: u64,
    /// Pause between teardown and reopen on a manual reconnect.
    pub manual_reconnect_delay_ms: u64,
    /// Buffered frames per direction on a channel.
    pub channel_capacity: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            origin: "http://localhost:8000".to_string(),
            reconnect_interval_ms: 3_000,
            max_reconnect_attempts: 10,
            keepalive_interval_ms: 30_000,
            manual_reconnect_delay_ms: 100,
            channel_capacity: 256,
        }
    }
}

impl ConnectionSettings {
    /// Reconnect delay as a [`Duration`].
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    /// Keep-alive period as a [`Duration`].
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }

    /// Manual reconnect delay as a [`Duration`].
    pub fn manual_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.manual_reconnect_delay_ms)
    }
}

/// Notification settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Show ephemeral toasts for notifications.
    pub show_toasts: bool,
    /// Show desktop notifications (permission-gated).
    pub browser_notifications: bool,
    /// History entries kept before the oldest are evicted.
    pub max_entries: usize,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            show_toasts: true,
            browser_notifications: false,
            max_entries: 50,
        }
    }
}

/// Streaming chat settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Ask the server to use retrieval augmentation.
    pub use_rag: bool,
    /// Silence on the stream after which the exchange falls back.
    pub stream_idle_timeout_ms: u64,
    /// Timeout of the synchronous fallback request.
    pub request_timeout_ms: u64,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            use_rag: true,
            stream_idle_timeout_ms: 120_000,
            request_timeout_ms: 60_000,
        }
    }
}

impl ChatSettings {
    /// Stream idle timeout as a [`Duration`].
    pub fn stream_idle_timeout(&self) -> Duration {
        Duration::from_millis(self.stream_idle_timeout_ms)
    }

    /// Fallback request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Log output settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
