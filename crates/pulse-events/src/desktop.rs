//! Desktop notification side channel.
//!
//! Permission-gated: nothing is shown unless the observer is enabled and the
//! platform reports [`Permission::Granted`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::errors::ObserverError;
use crate::notifications::{Notification, NotificationObserver};

/// Title used when a notification has none.
pub const DEFAULT_TITLE: &str = "Workflow Manager";

/// Platform permission to show desktop notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// Not asked yet.
    Default,
    /// Allowed.
    Granted,
    /// Refused by the user.
    Denied,
    /// The platform has no desktop notifications.
    Unsupported,
}

/// A desktop notification ready to be shown.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DesktopNotification {
    /// Heading.
    pub title: String,
    /// Body text.
    pub body: String,
    /// Page to open when the notification is clicked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl DesktopNotification {
    /// Desktop notification for a history entry.
    pub fn for_notification(notification: &Notification) -> Self {
        Self {
            title: notification
                .title
                .clone()
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            body: notification.message.clone(),
            action_url: notification.action_url.clone(),
        }
    }
}

/// Platform desktop notification facility.
#[async_trait]
pub trait DesktopNotifier: Send + Sync {
    /// Current permission, without prompting.
    fn permission(&self) -> Permission;

    /// Prompt the user for permission.
    async fn request_permission(&self) -> Permission;

    /// Present a notification.
    fn show(&self, notification: DesktopNotification) -> Result<(), ObserverError>;
}

/// Shows a desktop notification per history entry while enabled.
pub struct DesktopObserver {
    enabled: AtomicBool,
    notifier: Arc<dyn DesktopNotifier>,
}

impl DesktopObserver {
    /// Observer using `notifier`, initially disabled.
    pub fn new(notifier: Arc<dyn DesktopNotifier>) -> Self {
        Self {
            enabled: AtomicBool::new(false),
            notifier,
        }
    }

    /// Turn desktop notifications on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether the user wants desktop notifications.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Current platform permission.
    pub fn permission(&self) -> Permission {
        self.notifier.permission()
    }

    /// Obtain permission, prompting only if the user has not decided yet.
    pub async fn request_permission(&self) -> Permission {
        match self.notifier.permission() {
            Permission::Default => {
                let permission = self.notifier.request_permission().await;
                debug!(?permission, "desktop notification permission requested");
                permission
            }
            decided => decided,
        }
    }
}

impl NotificationObserver for DesktopObserver {
    fn on_notification(&self, notification: &Notification) -> Result<(), ObserverError> {
        if !self.is_enabled() {
            return Ok(());
        }
        match self.notifier.permission() {
            Permission::Granted => self
                .notifier
                .show(DesktopNotification::for_notification(notification)),
            Permission::Unsupported => Err(ObserverError::Unavailable(
                "desktop notifications".into(),
            )),
            Permission::Default | Permission::Denied => Err(ObserverError::PermissionDenied),
        }
    }
}
