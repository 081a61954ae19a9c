//! Notification history.
//!
//! A bounded, newest-first log of every notification received, with an
//! unread counter. Observers see each entry after it has been recorded; an
//! observer that errors or panics never affects the log.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use pulse_core::{NotificationId, NotificationLevel, NotificationPayload};
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::ObserverError;

/// One history entry.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    /// Per-session sequence id, starting at 1.
    pub id: NotificationId,
    /// Body text.
    pub message: String,
    /// Severity.
    pub level: NotificationLevel,
    /// Optional heading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional link to the related page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Whether the user has seen it.
    pub read: bool,
}

/// Something that wants to present new notifications.
pub trait NotificationObserver: Send + Sync {
    /// Called once per recorded entry, after the history was updated.
    fn on_notification(&self, notification: &Notification) -> Result<(), ObserverError>;
}

#[derive(Default)]
struct HistoryState {
    entries: VecDeque<Notification>,
    last_id: u64,
    unread: usize,
}

/// Bounded newest-first notification log.
pub struct NotificationHistory {
    max_entries: usize,
    state: Mutex<HistoryState>,
    observers: RwLock<Vec<Arc<dyn NotificationObserver>>>,
}

impl NotificationHistory {
    /// History keeping at most `max_entries` (clamped to at least 1).
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            state: Mutex::new(HistoryState::default()),
            observers: RwLock::new(Vec::new()),
        }
    }

    /// Register an observer for future entries.
    pub fn add_observer(&self, observer: Arc<dyn NotificationObserver>) {
        self.observers.write().push(observer);
    }

    /// Record a notification and hand it to the observers.
    pub fn ingest(&self, payload: NotificationPayload) -> Notification {
        let entry = {
            let mut state = self.state.lock();
            state.last_id += 1;
            let entry = Notification {
                id: NotificationId::new(state.last_id),
                message: payload.message,
                level: payload.level,
                title: payload.title,
                action_url: payload.action_url,
                timestamp: Utc::now(),
                read: false,
            };
            state.entries.push_front(entry.clone());
            state.unread += 1;
            while state.entries.len() > self.max_entries {
                if let Some(evicted) = state.entries.pop_back() {
                    if !evicted.read {
                        state.unread -= 1;
                    }
                }
            }
            entry
        };
        debug!(id = %entry.id, level = ?entry.level, "notification recorded");

        let observers = self.observers.read().clone();
        for observer in observers {
            match catch_unwind(AssertUnwindSafe(|| observer.on_notification(&entry))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => debug!(error = %e, "notification observer failed"),
                Err(_) => warn!("notification observer panicked"),
            }
        }
        entry
    }

    /// Mark one entry read. Returns `true` if it was unread.
    pub fn mark_as_read(&self, id: NotificationId) -> bool {
        let mut state = self.state.lock();
        let Some(entry) = state.entries.iter_mut().find(|n| n.id == id && !n.read) else {
            return false;
        };
        entry.read = true;
        state.unread -= 1;
        true
    }

    /// Mark every entry read.
    pub fn mark_all_as_read(&self) {
        let mut state = self.state.lock();
        for entry in &mut state.entries {
            entry.read = true;
        }
        state.unread = 0;
    }

    /// Drop every entry. Ids keep counting up.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.entries.clear();
        state.unread = 0;
    }

    /// Snapshot of the entries, newest first.
    pub fn entries(&self) -> Vec<Notification> {
        self.state.lock().entries.iter().cloned().collect()
    }

    /// Number of unread entries.
    pub fn unread_count(&self) -> usize {
        self.state.lock().unread
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retention limit.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
