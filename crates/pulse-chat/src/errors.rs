//! Chat error types.

use pulse_api::ApiError;
use thiserror::Error;

/// Why an exchange ended without a reply.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The server refused the request on the stream. Not retried.
    #[error("server error: {0}")]
    Server(String),
    /// The stream failed and so did the HTTP fallback.
    #[error("fallback request failed: {0}")]
    Fallback(#[from] ApiError),
}

impl ChatError {
    /// Text suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server(message) => message.clone(),
            Self::Fallback(e) => e.user_message(),
        }
    }
}
