//! Channel URL derivation.
//!
//! The channel scheme mirrors the page origin: `http` becomes `ws`, `https`
//! becomes `wss`. Host and port are kept; path, query and fragment are
//! replaced.

use pulse_core::ConversationId;
use url::Url;

use crate::errors::TransportError;

/// Path of the shared event channel.
pub const EVENT_CHANNEL_PATH: &str = "/ws";

/// `ws(s)://host/ws` for the given origin.
pub fn event_channel_url(origin: &str) -> Result<Url, TransportError> {
    with_path(origin, EVENT_CHANNEL_PATH)
}

/// `ws(s)://host/ws/chat/{id}` for the given origin.
pub fn chat_channel_url(origin: &str, conversation: ConversationId) -> Result<Url, TransportError> {
    with_path(origin, &format!("{EVENT_CHANNEL_PATH}/chat/{conversation}"))
}

fn with_path(origin: &str, path: &str) -> Result<Url, TransportError> {
    let mut url = ws_origin(origin)?;
    url.set_path(path);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn ws_origin(origin: &str) -> Result<Url, TransportError> {
    let invalid = |reason: String| TransportError::InvalidUrl {
        url: origin.to_string(),
        reason,
    };
    let mut url = Url::parse(origin).map_err(|e| invalid(e.to_string()))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(invalid(format!("unsupported scheme {other:?}"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| invalid(format!("cannot switch to {scheme}")))?;
    Ok(url)
}
