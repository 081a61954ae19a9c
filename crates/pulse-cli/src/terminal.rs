//! Terminal renditions of the notification side channels.

use std::io::Write as _;

use async_trait::async_trait;
use pulse_events::{
    DesktopNotification, DesktopNotifier, ObserverError, Permission, Toast, ToastSink, ToastStyle,
};

/// Prints toasts to stderr.
pub struct TerminalToasts;

impl TerminalToasts {
    /// One-line rendering of a toast.
    pub fn render(toast: &Toast) -> String {
        let tag = match toast.style {
            ToastStyle::Plain => "info",
            ToastStyle::Success => "ok",
            ToastStyle::Warning => "warn",
            ToastStyle::Error => "error",
        };
        match toast.icon {
            Some(icon) => format!("[{tag}] {icon} {}", toast.message),
            None => format!("[{tag}] {}", toast.message),
        }
    }
}

impl ToastSink for TerminalToasts {
    fn show(&self, toast: Toast) -> Result<(), ObserverError> {
        writeln!(std::io::stderr(), "{}", Self::render(&toast))
            .map_err(|e| ObserverError::Failed(e.to_string()))
    }
}

/// A terminal has no desktop notifications.
pub struct NoDesktop;

#[async_trait]
impl DesktopNotifier for NoDesktop {
    fn permission(&self) -> Permission {
        Permission::Unsupported
    }

    async fn request_permission(&self) -> Permission {
        Permission::Unsupported
    }

    fn show(&self, _notification: DesktopNotification) -> Result<(), ObserverError> {
        Err(ObserverError::Unavailable("terminal".into()))
    }
}
