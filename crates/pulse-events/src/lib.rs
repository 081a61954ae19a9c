//! # pulse-events
//!
//! Everything that happens to a frame after the channel delivers it.
//!
//! - [`Router`]: decodes envelopes and fans them out by [`EventKind`](pulse_core::EventKind)
//! - [`NotificationHistory`]: bounded newest-first notification log with an
//!   unread counter and observers
//! - [`ToastObserver`] / [`DesktopObserver`]: side channels fed by the history
//! - [`RealtimeHub`]: wires the pieces to a [`ConnectionManager`](pulse_transport::ConnectionManager)

#![deny(unsafe_code)]

pub mod desktop;
pub mod errors;
pub mod hub;
pub mod notifications;
pub mod router;
pub mod toast;

pub use desktop::{
    DEFAULT_TITLE, DesktopNotification, DesktopNotifier, DesktopObserver, Permission,
};
pub use errors::ObserverError;
pub use hub::RealtimeHub;
pub use notifications::{Notification, NotificationHistory, NotificationObserver};
pub use router::{Router, Subscription};
pub use toast::{Toast, ToastObserver, ToastSink, ToastStyle};
