//! Ephemeral toast side channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pulse_core::NotificationLevel;

use crate::errors::ObserverError;
use crate::notifications::{Notification, NotificationObserver};

/// How long error toasts stay up.
pub const ERROR_TOAST_DURATION: Duration = Duration::from_millis(5_000);
/// How long every other toast stays up.
pub const TOAST_DURATION: Duration = Duration::from_millis(4_000);

/// Visual style of a toast.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastStyle {
    /// Neutral.
    Plain,
    /// Green.
    Success,
    /// Amber, with an icon.
    Warning,
    /// Red.
    Error,
}

/// A toast ready to be shown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    /// Text.
    pub message: String,
    /// Style.
    pub style: ToastStyle,
    /// How long it stays visible.
    pub duration: Duration,
    /// Leading icon, if any.
    pub icon: Option<&'static str>,
}

impl Toast {
    /// Toast for a history entry.
    pub fn for_notification(notification: &Notification) -> Self {
        let (style, icon) = match notification.level {
            NotificationLevel::Success => (ToastStyle::Success, None),
            NotificationLevel::Error => (ToastStyle::Error, None),
            NotificationLevel::Warning => (ToastStyle::Warning, Some("⚠️")),
            NotificationLevel::Info => (ToastStyle::Plain, None),
        };
        let duration = if style == ToastStyle::Error {
            ERROR_TOAST_DURATION
        } else {
            TOAST_DURATION
        };
        Self {
            message: notification.message.clone(),
            style,
            duration,
            icon,
        }
    }
}

/// Where toasts are drawn.
pub trait ToastSink: Send + Sync {
    /// Show `toast`.
    fn show(&self, toast: Toast) -> Result<(), ObserverError>;
}

/// Shows a toast per notification while enabled.
pub struct ToastObserver {
    enabled: AtomicBool,
    sink: Arc<dyn ToastSink>,
}

impl ToastObserver {
    /// Observer drawing to `sink`, initially enabled.
    pub fn new(sink: Arc<dyn ToastSink>) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            sink,
        }
    }

    /// Turn toasts on or off.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Whether toasts are shown.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }
}

impl NotificationObserver for ToastObserver {
    fn on_notification(&self, notification: &Notification) -> Result<(), ObserverError> {
        if !self.is_enabled() {
            return Ok(());
        }
        self.sink.show(Toast::for_notification(notification))
    }
}
