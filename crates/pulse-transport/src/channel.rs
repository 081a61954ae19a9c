//! Transport-agnostic text channel.
//!
//! A [`Channel`] is what the rest of the crate talks to: a bounded queue of
//! outbound text frames and a queue of inbound ones. The receiver yielding
//! `None` means the channel closed. Dropping every [`ChannelSender`] closes
//! the outbound direction, which transports turn into a close frame.

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::errors::TransportError;

/// Opens channels to an endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a channel to `url`.
    async fn open(&self, url: &str) -> Result<Channel, TransportError>;
}

/// Client side of an open channel.
#[derive(Debug)]
pub struct Channel {
    /// Outbound frames.
    pub sender: ChannelSender,
    /// Inbound frames; `None` once closed.
    pub receiver: mpsc::Receiver<String>,
}

/// Transport side of an open channel.
#[derive(Debug)]
pub struct ChannelPeer {
    /// Frames the client sent.
    pub outbound: mpsc::Receiver<String>,
    /// Frames to deliver to the client. Dropping it closes the channel.
    pub inbound: mpsc::Sender<String>,
}

impl Channel {
    /// Create a connected client/transport pair with `capacity` buffered
    /// frames per direction.
    pub fn pair(capacity: usize) -> (Self, ChannelPeer) {
        let (out_tx, out_rx) = mpsc::channel(capacity);
        let (in_tx, in_rx) = mpsc::channel(capacity);
        (
            Self {
                sender: ChannelSender { tx: out_tx },
                receiver: in_rx,
            },
            ChannelPeer {
                outbound: out_rx,
                inbound: in_tx,
            },
        )
    }
}

/// Cloneable handle for writing frames to a channel.
#[derive(Clone, Debug)]
pub struct ChannelSender {
    tx: mpsc::Sender<String>,
}

impl ChannelSender {
    /// Enqueue a frame without waiting.
    ///
    /// Returns `false` if the channel is closed or its buffer is full.
    pub fn try_send(&self, frame: String) -> bool {
        self.tx.try_send(frame).is_ok()
    }

    /// Serialize and enqueue a frame, waiting for buffer space.
    pub async fn send_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<(), TransportError> {
        let frame = serde_json::to_string(value)?;
        self.tx.send(frame).await.map_err(|_| TransportError::Closed)
    }

    /// Whether the transport side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
