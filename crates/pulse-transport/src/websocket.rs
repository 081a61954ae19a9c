//! WebSocket transport over `tokio-tungstenite`.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, trace};
use url::Url;

use crate::channel::{Channel, ChannelPeer, Transport};
use crate::errors::TransportError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Opens `ws://` and `wss://` channels.
#[derive(Clone, Debug)]
pub struct WebSocketTransport {
    capacity: usize,
}

impl WebSocketTransport {
    /// Transport whose channels buffer `capacity` frames per direction.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
        }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, url: &str) -> Result<Channel, TransportError> {
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: url.to_string(),
            reason,
        };
        let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "ws" | "wss") {
            return Err(invalid(format!("unsupported scheme {:?}", parsed.scheme())));
        }

        let (ws, _) = connect_async(url)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        debug!(url, "websocket open");

        let (channel, peer) = Channel::pair(self.capacity);
        let _ = tokio::spawn(pump(ws, peer));
        Ok(channel)
    }
}

/// Bridge a socket to the transport side of a channel until either side
/// goes away.
async fn pump(ws: WsStream, mut peer: ChannelPeer) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    loop {
        tokio::select! {
            frame = peer.outbound.recv() => {
                let Some(text) = frame else {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                };
                if ws_tx.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if peer.inbound.send(text.to_string()).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        trace!(?frame, "close frame received");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "websocket read failed");
                        break;
                    }
                    None => break,
                }
            }
        }
    }
    debug!("websocket pump stopped");
}
