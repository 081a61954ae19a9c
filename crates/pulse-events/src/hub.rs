//! Application-level wiring.
//!
//! [`RealtimeHub`] owns one connection manager, the router it feeds, the
//! notification history and both side channels, and keeps the user's
//! notification toggles in sync with the server.

use std::sync::Arc;

use pulse_api::{BROWSER_NOTIFICATIONS_KEY, PreferencesApi, TOAST_NOTIFICATIONS_KEY};
use pulse_core::{ConnectionStatus, EventKind, ServerEvent};
use pulse_settings::PulseSettings;
use pulse_transport::{ConnectionManager, ManagerConfig, Transport, TransportError};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::desktop::{DesktopNotifier, DesktopObserver, Permission};
use crate::notifications::{NotificationHistory, NotificationObserver};
use crate::router::{Router, Subscription};
use crate::toast::{ToastObserver, ToastSink};

/// The real-time layer as one object.
pub struct RealtimeHub {
    manager: ConnectionManager,
    router: Router,
    history: Arc<NotificationHistory>,
    toasts: Arc<ToastObserver>,
    desktop: Arc<DesktopObserver>,
    preferences: Arc<dyn PreferencesApi>,
}

impl RealtimeHub {
    /// Wire everything up. Nothing connects until [`start`](Self::start).
    pub fn new(
        settings: &PulseSettings,
        transport: Arc<dyn Transport>,
        preferences: Arc<dyn PreferencesApi>,
        toast_sink: Arc<dyn ToastSink>,
        notifier: Arc<dyn DesktopNotifier>,
    ) -> Result<Self, TransportError> {
        let history = Arc::new(NotificationHistory::new(
            settings.notifications.max_entries,
        ));

        let toasts = Arc::new(ToastObserver::new(toast_sink));
        toasts.set_enabled(settings.notifications.show_toasts);
        let desktop = Arc::new(DesktopObserver::new(notifier));
        desktop.set_enabled(settings.notifications.browser_notifications);
        history.add_observer(Arc::clone(&toasts) as Arc<dyn NotificationObserver>);
        history.add_observer(Arc::clone(&desktop) as Arc<dyn NotificationObserver>);

        let router = Router::new(Arc::clone(&history));
        let manager = ConnectionManager::new(
            ManagerConfig::from_settings(&settings.connection)?,
            transport,
            Arc::new(router.clone()),
        );

        Ok(Self {
            manager,
            router,
            history,
            toasts,
            desktop,
            preferences,
        })
    }

    /// Connect, then apply stored preferences once they load.
    ///
    /// The channel does not wait on the preferences request. Until it
    /// answers, and for good if it fails, the configured defaults stay.
    pub async fn start(&self) {
        self.manager.connect();
        info!(url = self.manager.url(), "realtime hub started");
        match self.preferences.load_notification_preferences().await {
            Ok(prefs) => {
                self.toasts.set_enabled(prefs.toast_notifications);
                self.desktop.set_enabled(prefs.browser_notifications);
                debug!(?prefs, "notification preferences applied");
            }
            Err(e) => debug!(error = %e, "notification preferences unavailable, using defaults"),
        }
    }

    /// Disconnect and stop reconnecting.
    pub fn shutdown(&self) {
        self.manager.disconnect();
    }

    /// Manual reconnect with a fresh attempt budget.
    pub async fn reconnect(&self) {
        self.manager.reconnect().await;
    }

    /// Send a JSON frame on the shared channel. `true` iff accepted.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> bool {
        self.manager.send(payload)
    }

    /// Subscribe to events of `kind`.
    pub fn subscribe<F>(&self, kind: impl Into<EventKind>, callback: F) -> Subscription
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        self.router.subscribe(kind, callback)
    }

    /// Ask for desktop notifications. Enables them and persists the choice
    /// if permission is granted; returns whether it was.
    pub async fn enable_desktop_notifications(&self) -> bool {
        let permission = self.desktop.request_permission().await;
        if permission != Permission::Granted {
            info!(?permission, "desktop notifications not permitted");
            return false;
        }
        self.desktop.set_enabled(true);
        self.persist(BROWSER_NOTIFICATIONS_KEY, true).await;
        true
    }

    /// Stop desktop notifications and persist the choice.
    pub async fn disable_desktop_notifications(&self) {
        self.desktop.set_enabled(false);
        self.persist(BROWSER_NOTIFICATIONS_KEY, false).await;
    }

    /// Show toasts again and persist the choice.
    pub async fn enable_toasts(&self) {
        self.toasts.set_enabled(true);
        self.persist(TOAST_NOTIFICATIONS_KEY, true).await;
    }

    /// Stop toasts and persist the choice.
    pub async fn disable_toasts(&self) {
        self.toasts.set_enabled(false);
        self.persist(TOAST_NOTIFICATIONS_KEY, false).await;
    }

    async fn persist(&self, key: &str, enabled: bool) {
        let value = if enabled { "true" } else { "false" };
        if let Err(e) = self.preferences.save_preference(key, value).await {
            debug!(key, error = %e, "failed to persist preference");
        }
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.manager.status()
    }

    /// Observe connection status changes.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.manager.watch_status()
    }

    /// Whether the shared channel is open.
    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Whether toasts are shown.
    pub fn toasts_enabled(&self) -> bool {
        self.toasts.is_enabled()
    }

    /// Whether desktop notifications are actually shown (wanted and permitted).
    pub fn desktop_notifications_enabled(&self) -> bool {
        self.desktop.is_enabled() && self.desktop.permission() == Permission::Granted
    }

    /// Platform permission for desktop notifications.
    pub fn desktop_permission(&self) -> Permission {
        self.desktop.permission()
    }

    /// The connection manager.
    pub fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// The router.
    pub fn router(&self) -> &Router {
        &self.router
    }

    /// The notification history.
    pub fn history(&self) -> &Arc<NotificationHistory> {
        &self.history
    }
}
