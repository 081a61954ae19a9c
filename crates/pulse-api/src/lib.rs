//! # pulse-api
//!
//! The synchronous HTTP side of the Pulse real-time layer.
//!
//! - [`ChatApi`]: non-streaming chat fallback
//! - [`PreferencesApi`]: stored notification toggles
//! - [`RestClient`]: `reqwest` implementation of both

#![deny(unsafe_code)]

pub mod client;
pub mod errors;
pub mod traits;

pub use client::RestClient;
pub use errors::ApiError;
pub use traits::{
    BROWSER_NOTIFICATIONS_KEY, ChatApi, NotificationPreferences, PreferencesApi,
    TOAST_NOTIFICATIONS_KEY,
};
