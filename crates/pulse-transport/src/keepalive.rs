//! Keep-alive pings for an open channel.

use std::time::Duration;

use pulse_core::ClientMessage;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::channel::ChannelSender;

/// Send `{"type":"ping"}` every `period` until cancelled.
///
/// The first ping goes out one full period after start. A ping the channel
/// refuses is dropped silently.
pub async fn run_keepalive(sender: ChannelSender, period: Duration, cancel: CancellationToken) {
    let Ok(ping) = serde_json::to_string(&ClientMessage::Ping) else {
        return;
    };
    let mut ticker = time::interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !sender.try_send(ping.clone()) {
                    trace!("keep-alive ping dropped");
                }
            }
            () = cancel.cancelled() => return,
        }
    }
}
