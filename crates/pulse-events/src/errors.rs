//! Observer error types.

use thiserror::Error;

/// Why a side channel could not present a notification.
#[derive(Debug, Error)]
pub enum ObserverError {
    /// The platform has no such facility.
    #[error("notification facility unavailable: {0}")]
    Unavailable(String),
    /// The user has not granted permission.
    #[error("notification permission denied")]
    PermissionDenied,
    /// Presenting failed.
    #[error("failed to present notification: {0}")]
    Failed(String),
}
