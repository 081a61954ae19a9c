//! REST error types.

use thiserror::Error;

/// Errors from a REST call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, bad URL).
    #[error("request failed: {0}")]
    Request(String),
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
    /// The response body did not have the expected shape.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Server-provided `detail` message if the body carries one, else the
    /// display form.
    pub fn user_message(&self) -> String {
        if let Self::Status { body, .. } = self {
            if let Some(detail) = serde_json::from_str::<serde_json::Value>(body)
                .ok()
                .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
            {
                return detail;
            }
        }
        self.to_string()
    }
}
