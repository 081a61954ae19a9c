//! `RealtimeHub` end to end over an in-memory transport.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use pulse_api::{ApiError, NotificationPreferences, PreferencesApi};
use pulse_core::{ConnectionStatus, EventKind};
use pulse_events::{
    DesktopNotification, DesktopNotifier, ObserverError, Permission, RealtimeHub, Toast,
    ToastSink, ToastStyle,
};
use pulse_settings::PulseSettings;
use pulse_transport::{Channel, ChannelPeer, Transport, TransportError};
use tokio::time::timeout;

const TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct MemoryTransport {
    peers: Mutex<Vec<ChannelPeer>>,
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn open(&self, _url: &str) -> Result<Channel, TransportError> {
        let (channel, peer) = Channel::pair(16);
        self.peers.lock().push(peer);
        Ok(channel)
    }
}

impl MemoryTransport {
    async fn peer(&self) -> ChannelPeer {
        timeout(TIMEOUT, async {
            loop {
                if let Some(peer) = self.peers.lock().pop() {
                    return peer;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap()
    }
}

struct FakePreferences {
    stored: Option<NotificationPreferences>,
    load_delay: Duration,
    fail_saves: AtomicBool,
    saved: Mutex<Vec<(String, String)>>,
}

impl FakePreferences {
    fn new(stored: Option<NotificationPreferences>) -> Arc<Self> {
        Self::slow(stored, Duration::ZERO)
    }

    fn slow(stored: Option<NotificationPreferences>, load_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            stored,
            load_delay,
            fail_saves: AtomicBool::new(false),
            saved: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl PreferencesApi for FakePreferences {
    async fn load_notification_preferences(&self) -> Result<NotificationPreferences, ApiError> {
        tokio::time::sleep(self.load_delay).await;
        self.stored
            .ok_or_else(|| ApiError::Request("connection refused".into()))
    }

    async fn save_preference(&self, key: &str, value: &str) -> Result<(), ApiError> {
        self.saved.lock().push((key.to_string(), value.to_string()));
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ApiError::Status {
                status: 500,
                body: String::new(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
struct Toasts(Mutex<Vec<Toast>>);

impl ToastSink for Toasts {
    fn show(&self, toast: Toast) -> Result<(), ObserverError> {
        self.0.lock().push(toast);
        Ok(())
    }
}

struct Notifier {
    permission: Mutex<Permission>,
    answer: Permission,
    shown: Mutex<Vec<DesktopNotification>>,
}

impl Notifier {
    fn new(permission: Permission, answer: Permission) -> Arc<Self> {
        Arc::new(Self {
            permission: Mutex::new(permission),
            answer,
            shown: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl DesktopNotifier for Notifier {
    fn permission(&self) -> Permission {
        *self.permission.lock()
    }

    async fn request_permission(&self) -> Permission {
        *self.permission.lock() = self.answer;
        self.answer
    }

    fn show(&self, notification: DesktopNotification) -> Result<(), ObserverError> {
        self.shown.lock().push(notification);
        Ok(())
    }
}

struct Fixture {
    hub: RealtimeHub,
    transport: Arc<MemoryTransport>,
    preferences: Arc<FakePreferences>,
    toasts: Arc<Toasts>,
    notifier: Arc<Notifier>,
}

fn fixture(stored: Option<NotificationPreferences>, permission: Permission) -> Fixture {
    fixture_with(FakePreferences::new(stored), permission)
}

fn fixture_with(preferences: Arc<FakePreferences>, permission: Permission) -> Fixture {
    let transport = Arc::new(MemoryTransport::default());
    let toasts = Arc::new(Toasts::default());
    let notifier = Notifier::new(permission, Permission::Granted);
    let hub = RealtimeHub::new(
        &PulseSettings::default(),
        Arc::clone(&transport) as Arc<dyn Transport>,
        Arc::clone(&preferences) as Arc<dyn PreferencesApi>,
        Arc::clone(&toasts) as Arc<dyn ToastSink>,
        Arc::clone(&notifier) as Arc<dyn DesktopNotifier>,
    )
    .unwrap();
    Fixture {
        hub,
        transport,
        preferences,
        toasts,
        notifier,
    }
}

async fn wait_connected(hub: &RealtimeHub) {
    let mut rx = hub.watch_status();
    let _ = timeout(TIMEOUT, rx.wait_for(|s| *s == ConnectionStatus::Connected))
        .await
        .unwrap()
        .unwrap();
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

#[tokio::test]
async fn notifications_reach_history_and_toasts() {
    let f = fixture(None, Permission::Default);
    f.hub.start().await;
    wait_connected(&f.hub).await;
    let peer = f.transport.peer().await;

    let seen = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&seen);
    let _sub = f.hub.subscribe(EventKind::Notification, move |_| {
        *counter.lock() += 1;
    });

    peer.inbound
        .send(r#"{"type":"notification","data":{"message":"Disk almost full","level":"warning"}}"#.into())
        .await
        .unwrap();
    settle().await;

    assert_eq!(*seen.lock(), 1);
    assert_eq!(f.hub.history().unread_count(), 1);
    let toasts = f.toasts.0.lock();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].style, ToastStyle::Warning);
    assert_eq!(toasts[0].message, "Disk almost full");
    assert!(f.notifier.shown.lock().is_empty());
}

#[tokio::test]
async fn stored_preferences_override_defaults() {
    let f = fixture(
        Some(NotificationPreferences {
            browser_notifications: true,
            toast_notifications: false,
        }),
        Permission::Granted,
    );
    f.hub.start().await;
    wait_connected(&f.hub).await;
    assert!(!f.hub.toasts_enabled());
    assert!(f.hub.desktop_notifications_enabled());

    let peer = f.transport.peer().await;
    peer.inbound
        .send(r#"{"type":"notification","data":{"message":"Run 5 done","action_url":"/runs/5"}}"#.into())
        .await
        .unwrap();
    settle().await;

    assert!(f.toasts.0.lock().is_empty());
    let shown = f.notifier.shown.lock();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].title, "Workflow Manager");
    assert_eq!(shown[0].action_url.as_deref(), Some("/runs/5"));
}

#[tokio::test(start_paused = true)]
async fn connects_without_waiting_for_preferences() {
    let f = fixture_with(
        FakePreferences::slow(
            Some(NotificationPreferences {
                browser_notifications: false,
                toast_notifications: false,
            }),
            Duration::from_secs(60),
        ),
        Permission::Default,
    );

    let start = f.hub.start();
    tokio::pin!(start);
    tokio::select! {
        () = &mut start => panic!("preferences answered before the channel opened"),
        () = wait_connected(&f.hub) => {}
    }
    assert!(f.hub.is_connected());
    assert!(f.hub.toasts_enabled());

    start.await;
    assert!(!f.hub.toasts_enabled());
    assert!(f.hub.is_connected());
}

#[tokio::test]
async fn unavailable_preferences_keep_defaults_and_connect() {
    let f = fixture(None, Permission::Default);
    f.hub.start().await;
    wait_connected(&f.hub).await;
    assert!(f.hub.toasts_enabled());
    assert!(!f.hub.desktop_notifications_enabled());
}

#[tokio::test]
async fn enabling_desktop_requests_permission_and_persists() {
    let f = fixture(None, Permission::Default);
    assert!(f.hub.enable_desktop_notifications().await);
    assert!(f.hub.desktop_notifications_enabled());
    assert_eq!(
        *f.preferences.saved.lock(),
        vec![("browser_notifications".to_string(), "true".to_string())]
    );

    f.hub.disable_desktop_notifications().await;
    assert!(!f.hub.desktop_notifications_enabled());
    assert_eq!(f.preferences.saved.lock().len(), 2);
}

#[tokio::test]
async fn denied_permission_does_not_enable() {
    let f = fixture(None, Permission::Denied);
    assert!(!f.hub.enable_desktop_notifications().await);
    assert!(!f.hub.desktop_notifications_enabled());
    assert!(f.preferences.saved.lock().is_empty());
}

#[tokio::test]
async fn toast_toggles_survive_persist_failures() {
    let f = fixture(None, Permission::Default);
    f.preferences.fail_saves.store(true, Ordering::SeqCst);

    f.hub.disable_toasts().await;
    assert!(!f.hub.toasts_enabled());
    f.hub.enable_toasts().await;
    assert!(f.hub.toasts_enabled());
    assert_eq!(
        *f.preferences.saved.lock(),
        vec![
            ("toast_notifications".to_string(), "false".to_string()),
            ("toast_notifications".to_string(), "true".to_string()),
        ]
    );
}

#[tokio::test]
async fn shutdown_disconnects() {
    let f = fixture(None, Permission::Default);
    f.hub.start().await;
    wait_connected(&f.hub).await;
    assert!(f.hub.send(&serde_json::json!({"type": "ping"})));

    f.hub.shutdown();
    assert_eq!(f.hub.status(), ConnectionStatus::Disconnected);
    assert!(!f.hub.is_connected());
    assert!(!f.hub.send(&serde_json::json!({"type": "ping"})));
}
