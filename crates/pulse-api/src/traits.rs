//! Trait seams for the REST collaborators.

use async_trait::async_trait;
use pulse_core::{ConversationId, MessagePair};

use crate::errors::ApiError;

/// Stored-setting key of the desktop notification toggle.
pub const BROWSER_NOTIFICATIONS_KEY: &str = "browser_notifications";
/// Stored-setting key of the toast toggle.
pub const TOAST_NOTIFICATIONS_KEY: &str = "toast_notifications";

/// Non-streaming chat.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send `content` and wait for the full reply.
    async fn send_message(
        &self,
        conversation: ConversationId,
        content: &str,
    ) -> Result<MessagePair, ApiError>;
}

/// Notification toggles as stored on the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotificationPreferences {
    /// Desktop notifications wanted.
    pub browser_notifications: bool,
    /// Toasts wanted.
    pub toast_notifications: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            browser_notifications: false,
            toast_notifications: true,
        }
    }
}

impl NotificationPreferences {
    /// Interpret the server's string-valued settings map.
    ///
    /// Desktop notifications are on only for the literal `"true"`; toasts are
    /// off only for the literal `"false"`.
    pub fn from_settings(settings: &serde_json::Value) -> Self {
        let get = |key: &str| settings.get(key).and_then(serde_json::Value::as_str);
        Self {
            browser_notifications: get(BROWSER_NOTIFICATIONS_KEY) == Some("true"),
            toast_notifications: get(TOAST_NOTIFICATIONS_KEY) != Some("false"),
        }
    }
}

/// Server-side storage of user preferences.
#[async_trait]
pub trait PreferencesApi: Send + Sync {
    /// Fetch the notification toggles.
    async fn load_notification_preferences(&self) -> Result<NotificationPreferences, ApiError>;

    /// Persist one string-valued setting.
    async fn save_preference(&self, key: &str, value: &str) -> Result<(), ApiError>;
}
