//! Transport error types.

use thiserror::Error;

/// Errors raised while opening or using a channel.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The endpoint URL cannot be used. Never retried.
    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The handshake or TCP connect failed.
    #[error("failed to connect: {0}")]
    Connect(String),
    /// The channel is no longer open.
    #[error("channel closed")]
    Closed,
    /// A frame could not be serialized.
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

impl TransportError {
    /// Whether retrying the same operation can never succeed.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::InvalidUrl { .. })
    }
}
