//! Connection manager.
//!
//! Owns at most one channel at a time. A single driver task per lifecycle
//! opens the channel, pumps inbound frames to the [`InboundHandler`], and on
//! close retries at a constant interval until the attempt budget runs out.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──open──▶ Connected
//!       ▲                      │  ▲                  │
//!   disconnect            fail │  │ retry        close│
//!       │                      ▼  │                  ▼
//!       └──────────────── Reconnecting ◀─────────────┘
//!                              │ budget exhausted
//!                              ▼
//!                            Failed
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use pulse_core::{ClientMessage, ConnectionStatus};
use pulse_settings::ConnectionSettings;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::channel::{Channel, ChannelSender, Transport};
use crate::endpoint;
use crate::errors::TransportError;
use crate::keepalive::run_keepalive;

/// Receives every inbound text frame, in delivery order.
pub trait InboundHandler: Send + Sync {
    /// Handle one raw frame.
    fn handle(&self, raw: &str);
}

impl<F> InboundHandler for F
where
    F: Fn(&str) + Send + Sync,
{
    fn handle(&self, raw: &str) {
        self(raw);
    }
}

/// Connection manager configuration.
#[derive(Clone, Debug)]
pub struct ManagerConfig {
    /// Full channel URL (`ws(s)://host/ws`).
    pub url: String,
    /// Constant delay between automatic attempts.
    pub reconnect_interval: Duration,
    /// Automatic attempts before giving up.
    pub max_reconnect_attempts: u32,
    /// Keep-alive period while connected.
    pub keepalive_interval: Duration,
    /// Pause between teardown and reopen on [`ConnectionManager::reconnect`].
    pub manual_reconnect_delay: Duration,
}

impl ManagerConfig {
    /// Config for `url` with default timings.
    pub fn new(url: impl Into<String>) -> Self {
        let defaults = ConnectionSettings::default();
        Self {
            url: url.into(),
            reconnect_interval: defaults.reconnect_interval(),
            max_reconnect_attempts: defaults.max_reconnect_attempts,
            keepalive_interval: defaults.keepalive_interval(),
            manual_reconnect_delay: defaults.manual_reconnect_delay(),
        }
    }

    /// Config for the event channel of `settings.origin`.
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self, TransportError> {
        let url = endpoint::event_channel_url(&settings.origin)?;
        Ok(Self {
            url: url.into(),
            reconnect_interval: settings.reconnect_interval(),
            max_reconnect_attempts: settings.max_reconnect_attempts,
            keepalive_interval: settings.keepalive_interval(),
            manual_reconnect_delay: settings.manual_reconnect_delay(),
        })
    }
}

#[derive(Default)]
struct State {
    attempts: u32,
    sender: Option<ChannelSender>,
    driver: Option<JoinHandle<()>>,
    cancel: Option<CancellationToken>,
    /// Bumped by every `disconnect`.
    epoch: u64,
}

struct Inner {
    config: ManagerConfig,
    transport: Arc<dyn Transport>,
    handler: Arc<dyn InboundHandler>,
    state: Mutex<State>,
    status_tx: watch::Sender<ConnectionStatus>,
}

/// Keeps one long-lived channel open.
///
/// Must be used from within a Tokio runtime.
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager. Nothing is opened until [`connect`](Self::connect).
    pub fn new(
        config: ManagerConfig,
        transport: Arc<dyn Transport>,
        handler: Arc<dyn InboundHandler>,
    ) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                handler,
                state: Mutex::new(State::default()),
                status_tx,
            }),
        }
    }

    /// Start the connection lifecycle.
    ///
    /// No-op while a lifecycle is already running (connecting, connected or
    /// waiting to retry). The attempt budget is not reset.
    pub fn connect(&self) {
        let mut state = self.inner.state.lock();
        if state.driver.is_some() {
            debug!("connect ignored, lifecycle already running");
            return;
        }
        let token = CancellationToken::new();
        state.cancel = Some(token.clone());
        self.inner.set_status(ConnectionStatus::Connecting);
        let inner = Arc::clone(&self.inner);
        state.driver = Some(tokio::spawn(drive(inner, token)));
    }

    /// Tear down the channel and stop all automatic reconnects.
    pub fn disconnect(&self) {
        self.inner.disconnect();
    }

    /// Disconnect, reset the attempt budget, wait briefly, then connect.
    ///
    /// The connect is skipped if another [`disconnect`](Self::disconnect)
    /// happens during the wait.
    pub async fn reconnect(&self) {
        self.disconnect();
        let epoch = {
            let mut state = self.inner.state.lock();
            state.attempts = 0;
            state.epoch
        };
        time::sleep(self.inner.config.manual_reconnect_delay).await;
        let current = self.inner.state.lock().epoch;
        if current == epoch {
            self.connect();
        } else {
            debug!("manual reconnect superseded by disconnect");
        }
    }

    /// Serialize `payload` and enqueue it on the open channel.
    ///
    /// Returns `true` iff the frame was accepted. Never blocks.
    pub fn send<T: Serialize + ?Sized>(&self, payload: &T) -> bool {
        let frame = match serde_json::to_string(payload) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "failed to encode outbound frame");
                return false;
            }
        };
        let state = self.inner.state.lock();
        state.sender.as_ref().is_some_and(|s| s.try_send(frame))
    }

    /// Ask the server to subscribe this connection to `channel`.
    pub fn subscribe_channel(&self, channel: &str) -> bool {
        self.send(&ClientMessage::Subscribe {
            channel: channel.to_string(),
        })
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status_tx.borrow()
    }

    /// Receiver that observes every status change.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status_tx.subscribe()
    }

    /// Automatic attempts made since the last successful open.
    pub fn attempt_count(&self) -> u32 {
        self.inner.state.lock().attempts
    }

    /// Whether the channel is open.
    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// The channel URL.
    pub fn url(&self) -> &str {
        &self.inner.config.url
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        if let Some(driver) = state.driver.take() {
            driver.abort();
        }
        state.sender = None;
    }
}

impl Inner {
    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status_tx.send_replace(status);
        if previous != status {
            debug!(from = %previous, to = %status, "connection status changed");
        }
    }

    fn disconnect(&self) {
        let mut state = self.state.lock();
        if let Some(token) = state.cancel.take() {
            token.cancel();
        }
        if let Some(driver) = state.driver.take() {
            driver.abort();
        }
        state.attempts = self.config.max_reconnect_attempts;
        state.sender = None;
        state.epoch += 1;
        self.set_status(ConnectionStatus::Disconnected);
        info!(url = %self.config.url, "disconnected");
    }

    /// Mark the lifecycle owned by `token` as over. Returns `false` if it was
    /// already superseded.
    fn finish(&self, token: &CancellationToken, status: ConnectionStatus) -> bool {
        let mut state = self.state.lock();
        if token.is_cancelled() {
            return false;
        }
        state.sender = None;
        state.cancel = None;
        drop(state.driver.take());
        self.set_status(status);
        true
    }

    /// Run one open channel until it closes or the lifecycle is cancelled.
    async fn run_connected(&self, channel: Channel, token: &CancellationToken) {
        let Channel {
            sender,
            mut receiver,
        } = channel;
        {
            let mut state = self.state.lock();
            if token.is_cancelled() {
                return;
            }
            state.attempts = 0;
            state.sender = Some(sender.clone());
            self.set_status(ConnectionStatus::Connected);
        }
        info!(url = %self.config.url, "connected");

        let keepalive = token.child_token();
        let _ = tokio::spawn(run_keepalive(
            sender,
            self.config.keepalive_interval,
            keepalive.clone(),
        ));

        loop {
            tokio::select! {
                frame = receiver.recv() => match frame {
                    Some(raw) => self.handler.handle(&raw),
                    None => break,
                },
                () = token.cancelled() => break,
            }
        }
        keepalive.cancel();
    }
}

async fn drive(inner: Arc<Inner>, token: CancellationToken) {
    loop {
        let opened = tokio::select! {
            result = inner.transport.open(&inner.config.url) => result,
            () = token.cancelled() => return,
        };

        match opened {
            Ok(channel) => {
                inner.run_connected(channel, &token).await;
                info!(url = %inner.config.url, "channel closed");
            }
            Err(e) if e.is_permanent() => {
                warn!(error = %e, "cannot open channel, giving up");
                let _ = inner.finish(&token, ConnectionStatus::Failed);
                return;
            }
            Err(e) => warn!(error = %e, "failed to open channel"),
        }

        {
            let mut state = inner.state.lock();
            if token.is_cancelled() {
                return;
            }
            state.sender = None;
            if state.attempts >= inner.config.max_reconnect_attempts {
                drop(state);
                warn!(
                    attempts = inner.config.max_reconnect_attempts,
                    "reconnect attempts exhausted"
                );
                let _ = inner.finish(&token, ConnectionStatus::Failed);
                return;
            }
            state.attempts += 1;
            inner.set_status(ConnectionStatus::Reconnecting);
            info!(
                attempt = state.attempts,
                max = inner.config.max_reconnect_attempts,
                "scheduling reconnect"
            );
        }

        tokio::select! {
            () = time::sleep(inner.config.reconnect_interval) => {}
            () = token.cancelled() => return,
        }

        {
            let _state = inner.state.lock();
            if token.is_cancelled() {
                return;
            }
            inner.set_status(ConnectionStatus::Connecting);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
