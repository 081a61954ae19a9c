//! Message router.
//!
//! Decodes each raw frame once, records notifications in the history, then
//! fans the event out to the callbacks registered for its kind. Callbacks run
//! in registration order on the delivering task; a panicking callback is
//! logged and skipped.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use pulse_core::{EventKind, ServerEvent, SubscriberId};
use pulse_transport::InboundHandler;
use tracing::{trace, warn};

use crate::notifications::NotificationHistory;

type Callback = Arc<dyn Fn(&ServerEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    by_kind: HashMap<EventKind, Vec<(SubscriberId, Callback)>>,
    any: Vec<(SubscriberId, Callback)>,
}

struct RouterInner {
    registry: RwLock<Registry>,
    next_id: AtomicU64,
    history: Arc<NotificationHistory>,
}

/// Fans decoded events out to subscribers.
#[derive(Clone)]
pub struct Router {
    inner: Arc<RouterInner>,
}

impl Router {
    /// Router that records notifications in `history`.
    pub fn new(history: Arc<NotificationHistory>) -> Self {
        Self {
            inner: Arc::new(RouterInner {
                registry: RwLock::new(Registry::default()),
                next_id: AtomicU64::new(1),
                history,
            }),
        }
    }

    /// The notification history this router feeds.
    pub fn history(&self) -> &Arc<NotificationHistory> {
        &self.inner.history
    }

    /// Call `callback` for every event of `kind`.
    pub fn subscribe<F>(&self, kind: impl Into<EventKind>, callback: F) -> Subscription
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        let kind = kind.into();
        let id = self.next_id();
        self.inner
            .registry
            .write()
            .by_kind
            .entry(kind.clone())
            .or_default()
            .push((id, Arc::new(callback)));
        trace!(%id, kind = kind.as_str(), "subscribed");
        Subscription::new(&self.inner, Some(kind), id)
    }

    /// Call `callback` for every decoded event, after the kind-specific
    /// callbacks.
    pub fn subscribe_all<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ServerEvent) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.inner
            .registry
            .write()
            .any
            .push((id, Arc::new(callback)));
        Subscription::new(&self.inner, None, id)
    }

    /// Number of callbacks registered for `kind`.
    pub fn subscriber_count(&self, kind: &EventKind) -> usize {
        self.inner
            .registry
            .read()
            .by_kind
            .get(kind)
            .map_or(0, Vec::len)
    }

    /// Process one raw frame.
    pub fn route(&self, raw: &str) {
        let Some(event) = ServerEvent::decode(raw) else {
            trace!(len = raw.len(), "dropping undecodable frame");
            return;
        };

        if let Some(payload) = event.notification() {
            let _ = self.inner.history.ingest(payload);
        }

        let callbacks: Vec<Callback> = {
            let registry = self.inner.registry.read();
            registry
                .by_kind
                .get(&event.kind)
                .into_iter()
                .flatten()
                .chain(registry.any.iter())
                .map(|(_, cb)| Arc::clone(cb))
                .collect()
        };
        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(&event))).is_err() {
                warn!(kind = event.kind.as_str(), "event subscriber panicked");
            }
        }
    }

    fn next_id(&self) -> SubscriberId {
        SubscriberId::new(self.inner.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl InboundHandler for Router {
    fn handle(&self, raw: &str) {
        self.route(raw);
    }
}

/// Handle to one registered callback.
#[must_use = "dropping a Subscription keeps the callback registered; call unsubscribe to remove it"]
pub struct Subscription {
    router: Weak<RouterInner>,
    kind: Option<EventKind>,
    id: SubscriberId,
    active: AtomicBool,
}

impl Subscription {
    fn new(router: &Arc<RouterInner>, kind: Option<EventKind>, id: SubscriberId) -> Self {
        Self {
            router: Arc::downgrade(router),
            kind,
            id,
            active: AtomicBool::new(true),
        }
    }

    /// Id of the callback.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove exactly this callback. Further calls do nothing.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        let Some(router) = self.router.upgrade() else {
            return;
        };
        let mut registry = router.registry.write();
        let list = match &self.kind {
            Some(kind) => match registry.by_kind.get_mut(kind) {
                Some(list) => list,
                None => return,
            },
            None => &mut registry.any,
        };
        list.retain(|(id, _)| *id != self.id);
        if list.is_empty() {
            if let Some(kind) = &self.kind {
                let _ = registry.by_kind.remove(kind);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
